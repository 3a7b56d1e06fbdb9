use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Duration,
  NaiveDate,
  NaiveDateTime
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info
};
use uuid::Uuid;

use crate::datetime::parse_event_time;

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
  #[default]
  Blue,
  Green,
  Red,
  Yellow,
  Purple,
  Orange,
  Gray
}

impl EventColor {
  pub fn ansi_code(
    self
  ) -> &'static str {
    match self {
      | EventColor::Blue => "34",
      | EventColor::Green => "32",
      | EventColor::Red => "31",
      | EventColor::Yellow => "33",
      | EventColor::Purple => "35",
      | EventColor::Orange => "91",
      | EventColor::Gray => "90"
    }
  }
}

/// Event as it arrives from an events
/// file, before times are resolved.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
  #[serde(default)]
  pub id:       Option<String>,
  #[serde(default)]
  pub title:    String,
  pub start:    String,
  #[serde(default)]
  pub end:      Option<String>,
  #[serde(default)]
  pub all_day:  bool,
  #[serde(default)]
  pub color:    Option<EventColor>,
  #[serde(default)]
  pub location: Option<String>
}

/// An event on the local wall clock.
///
/// `start..=end` is an inclusive display
/// interval; layout code reads only the
/// calendar dates of the endpoints plus
/// `all_day` for ordering. `end >= start`
/// is established by
/// [`CalendarEvent::from_record`] and
/// assumed everywhere else.
#[derive(
  Debug, Clone, Serialize, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
  pub id:       String,
  pub title:    String,
  pub start:    NaiveDateTime,
  pub end:      NaiveDateTime,
  pub all_day:  bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color:    Option<EventColor>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>
}

impl CalendarEvent {
  pub fn new(
    id: impl Into<String>,
    title: impl Into<String>,
    start: NaiveDateTime,
    end: NaiveDateTime
  ) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      start,
      end,
      all_day: false,
      color: None,
      location: None
    }
  }

  pub fn with_all_day(
    mut self,
    all_day: bool
  ) -> Self {
    self.all_day = all_day;
    self
  }

  pub fn with_color(
    mut self,
    color: EventColor
  ) -> Self {
    self.color = Some(color);
    self
  }

  pub fn start_day(&self) -> NaiveDate {
    self.start.date()
  }

  pub fn end_day(&self) -> NaiveDate {
    self.end.date()
  }

  pub fn is_multi_day(&self) -> bool {
    self.start_day() != self.end_day()
  }

  pub fn duration(&self) -> Duration {
    self.end - self.start
  }

  /// Inclusive by calendar date on both
  /// endpoints.
  pub fn occupies(
    &self,
    day: NaiveDate
  ) -> bool {
    self.start_day() <= day
      && day <= self.end_day()
  }

  pub fn intersects(
    &self,
    from: NaiveDate,
    to: NaiveDate
  ) -> bool {
    self.start_day() <= to
      && self.end_day() >= from
  }

  pub fn from_record(
    record: EventRecord,
    timezone: Tz
  ) -> anyhow::Result<Self> {
    let id = record
      .id
      .map(|raw| raw.trim().to_string())
      .filter(|raw| !raw.is_empty())
      .unwrap_or_else(|| {
        Uuid::new_v4().to_string()
      });

    let start = parse_event_time(
      &record.start,
      timezone
    )
    .with_context(|| {
      format!(
        "invalid start for event {id}"
      )
    })?;
    let end = match record.end.as_deref()
    {
      | Some(raw) => {
        parse_event_time(raw, timezone)
          .with_context(|| {
            format!(
              "invalid end for event \
               {id}"
            )
          })?
      }
      | None => start
    };

    if end < start {
      return Err(anyhow!(
        "event {id} ends ({end}) before \
         it starts ({start})"
      ));
    }

    Ok(Self {
      id,
      title: record.title,
      start,
      end,
      all_day: record.all_day,
      color: record.color,
      location: record.location
    })
  }
}

/// Order in which events claim rows: all
/// day before timed, multi-day before
/// single-day, earlier start, longer
/// duration, then id.
pub fn layout_priority(
  a: &CalendarEvent,
  b: &CalendarEvent
) -> Ordering {
  b.all_day
    .cmp(&a.all_day)
    .then_with(|| {
      b.is_multi_day()
        .cmp(&a.is_multi_day())
    })
    .then_with(|| a.start.cmp(&b.start))
    .then_with(|| {
      b.duration().cmp(&a.duration())
    })
    .then_with(|| a.id.cmp(&b.id))
}

/// Order used when a single day is
/// listed: all-day first, then by start.
pub fn day_listing_order(
  a: &CalendarEvent,
  b: &CalendarEvent
) -> Ordering {
  b.all_day
    .cmp(&a.all_day)
    .then_with(|| a.start.cmp(&b.start))
    .then_with(|| a.end.cmp(&b.end))
    .then_with(|| a.id.cmp(&b.id))
}

#[tracing::instrument(skip(raw))]
pub fn parse_events(
  raw: &str,
  timezone: Tz
) -> anyhow::Result<Vec<CalendarEvent>>
{
  let records: Vec<EventRecord> =
    serde_json::from_str(raw).context(
      "events must be a JSON array of \
       event records"
    )?;

  let mut seen = BTreeSet::new();
  let mut events =
    Vec::with_capacity(records.len());
  for (index, record) in
    records.into_iter().enumerate()
  {
    let event = CalendarEvent::from_record(
      record, timezone
    )
    .with_context(|| {
      format!("event #{}", index + 1)
    })?;
    if !seen.insert(event.id.clone()) {
      return Err(anyhow!(
        "duplicate event id: {}",
        event.id
      ));
    }
    events.push(event);
  }

  debug!(
    events = events.len(),
    timezone = %timezone,
    "parsed events"
  );
  Ok(events)
}

#[tracing::instrument]
pub fn load_events(
  path: Option<&Path>,
  timezone: Tz
) -> anyhow::Result<Vec<CalendarEvent>>
{
  let Some(path) = path else {
    info!(
      "no events file configured; \
       laying out an empty calendar"
    );
    return Ok(Vec::new());
  };

  let raw = fs::read_to_string(path)
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
  parse_events(&raw, timezone)
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(
    raw: &str
  ) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(
      raw,
      "%Y-%m-%d %H:%M"
    )
    .expect("valid datetime")
  }

  #[test]
  fn occupancy_is_inclusive_by_date() {
    let event = CalendarEvent::new(
      "a",
      "Conference",
      at("2024-03-01 09:00"),
      at("2024-03-03 00:30")
    );
    for day in [1, 2, 3] {
      assert!(event.occupies(
        NaiveDate::from_ymd_opt(
          2024, 3, day
        )
        .expect("valid date")
      ));
    }
    assert!(!event.occupies(
      NaiveDate::from_ymd_opt(2024, 2, 29)
        .expect("valid date")
    ));
    assert!(!event.occupies(
      NaiveDate::from_ymd_opt(2024, 3, 4)
        .expect("valid date")
    ));
  }

  #[test]
  fn priority_puts_spanning_all_day_first(
  ) {
    let timed_multi = CalendarEvent::new(
      "timed-multi",
      "Trip",
      at("2024-03-01 08:00"),
      at("2024-03-02 08:00")
    );
    let all_day_single =
      CalendarEvent::new(
        "all-day",
        "Holiday",
        at("2024-03-02 00:00"),
        at("2024-03-02 00:00")
      )
      .with_all_day(true);
    let all_day_multi =
      CalendarEvent::new(
        "all-day-multi",
        "Offsite",
        at("2024-03-03 00:00"),
        at("2024-03-04 00:00")
      )
      .with_all_day(true);
    let short = CalendarEvent::new(
      "short",
      "Standup",
      at("2024-03-01 08:00"),
      at("2024-03-01 08:15")
    );
    let long = CalendarEvent::new(
      "long",
      "Workshop",
      at("2024-03-01 08:00"),
      at("2024-03-01 12:00")
    );

    let mut events = vec![
      short.clone(),
      timed_multi.clone(),
      long.clone(),
      all_day_single.clone(),
      all_day_multi.clone(),
    ];
    events.sort_by(layout_priority);

    let ids = events
      .iter()
      .map(|event| event.id.as_str())
      .collect::<Vec<_>>();
    assert_eq!(
      ids,
      vec![
        "all-day-multi",
        "all-day",
        "timed-multi",
        "long",
        "short"
      ]
    );
  }

  #[test]
  fn records_without_end_or_id_are_completed(
  ) {
    let events = parse_events(
      r#"[{"title":"Dentist","start":"2024-03-05T10:00"}]"#,
      chrono_tz::UTC
    )
    .expect("parse events");
    assert_eq!(events.len(), 1);
    assert_eq!(
      events[0].start,
      events[0].end
    );
    assert!(!events[0].id.is_empty());
    assert!(!events[0].all_day);
  }

  #[test]
  fn rejects_inverted_interval() {
    let err = parse_events(
      r#"[{"id":"x","title":"Bad","start":"2024-03-05","end":"2024-03-04"}]"#,
      chrono_tz::UTC
    )
    .expect_err("inverted event");
    assert!(
      format!("{err:#}")
        .contains("ends")
    );
  }

  #[test]
  fn rejects_duplicate_ids() {
    let raw = r#"[
      {"id":"dup","title":"One","start":"2024-03-05"},
      {"id":"dup","title":"Two","start":"2024-03-06"}
    ]"#;
    assert!(
      parse_events(raw, chrono_tz::UTC)
        .is_err()
    );
  }

  #[test]
  fn missing_events_file_means_empty() {
    let events =
      load_events(None, chrono_tz::UTC)
        .expect("empty load");
    assert!(events.is_empty());
  }
}
