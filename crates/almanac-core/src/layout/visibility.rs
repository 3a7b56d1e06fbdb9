use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::layout::slots::SlottedEvent;

#[derive(
  Debug, Clone, Serialize, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct DayVisibility<'a> {
  pub visible:      Vec<SlottedEvent<'a>>,
  pub hidden_count: usize
}

/// The slotted events occupying `day`,
/// spanning/all-day first, then by row.
fn ranked_day_events<'l, 'a>(
  day: NaiveDate,
  week_layout: &'l [SlottedEvent<'a>]
) -> Vec<&'l SlottedEvent<'a>> {
  let mut events = week_layout
    .iter()
    .filter(|entry| {
      entry.event.occupies(day)
    })
    .collect::<Vec<_>>();
  events.sort_by(|a, b| {
    let a_pinned = a.event.all_day
      || a.event.is_multi_day();
    let b_pinned = b.event.all_day
      || b.event.is_multi_day();
    b_pinned
      .cmp(&a_pinned)
      .then_with(|| {
        a.cell_slot.cmp(&b.cell_slot)
      })
      .then_with(|| {
        a.event.id.cmp(&b.event.id)
      })
  });
  events
}

/// Rows a day may fill with events when
/// it holds `total` of them; one row is
/// given up to the overflow indicator
/// once they do not all fit.
fn row_budget(
  total: usize,
  max_visible: usize
) -> usize {
  if total > max_visible {
    max_visible.saturating_sub(1)
  } else {
    total
  }
}

/// Ids of every event that overflows at
/// least one day of the week.
///
/// Such an event is left out on all of
/// its days so it never shows up as a
/// broken bar with gaps in the middle.
#[tracing::instrument(skip(week_layout), fields(events = week_layout.len()))]
pub fn hidden_ids_for_week<'a>(
  week_days: &[NaiveDate],
  week_layout: &[SlottedEvent<'a>],
  max_visible: usize
) -> BTreeSet<&'a str> {
  let mut hidden = BTreeSet::new();
  for day in week_days {
    let ranked = ranked_day_events(
      *day,
      week_layout
    );
    let budget =
      row_budget(ranked.len(), max_visible);
    for entry in
      ranked.into_iter().skip(budget)
    {
      let event = entry.event;
      hidden.insert(event.id.as_str());
    }
  }

  if !hidden.is_empty() {
    tracing::debug!(
      hidden = hidden.len(),
      max_visible,
      "events overflow their week"
    );
  }
  hidden
}

/// Splits the events of `day` into the
/// ones drawn and a count for the
/// "+N more" row.
pub fn day_visibility<'a>(
  day: NaiveDate,
  week_layout: &[SlottedEvent<'a>],
  hidden_ids_in_week: &BTreeSet<&str>,
  max_visible: usize
) -> DayVisibility<'a> {
  let ranked =
    ranked_day_events(day, week_layout);
  let total = ranked.len();
  let budget =
    row_budget(total, max_visible);

  let visible = ranked
    .into_iter()
    .filter(|entry| {
      !hidden_ids_in_week
        .contains(entry.event.id.as_str())
    })
    .take(budget)
    .copied()
    .collect::<Vec<_>>();

  DayVisibility {
    hidden_count: total - visible.len(),
    visible
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDateTime;

  use super::*;
  use crate::datetime::WeekCalendar;
  use crate::event::CalendarEvent;
  use crate::layout::slots::layout_week;

  fn at(
    raw: &str
  ) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(
      raw,
      "%Y-%m-%d %H:%M"
    )
    .expect("valid datetime")
  }

  fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d)
      .expect("valid date")
  }

  fn week() -> [NaiveDate; 7] {
    WeekCalendar::default()
      .week_days(date(6))
  }

  #[test]
  fn five_events_with_three_rows_show_two() {
    let events = (0..5)
      .map(|idx| {
        CalendarEvent::new(
          format!("e{idx}"),
          format!("Event {idx}"),
          at(&format!(
            "2024-03-06 {:02}:00",
            9 + idx
          )),
          at(&format!(
            "2024-03-06 {:02}:30",
            9 + idx
          ))
        )
      })
      .collect::<Vec<_>>();
    let layout =
      layout_week(&events, week()[0]);
    let hidden = hidden_ids_for_week(
      &week(),
      &layout,
      3
    );
    let day = day_visibility(
      date(6),
      &layout,
      &hidden,
      3
    );

    assert_eq!(day.visible.len(), 2);
    assert_eq!(day.hidden_count, 3);
    let shown = day
      .visible
      .iter()
      .map(|entry| entry.event.id.as_str())
      .collect::<Vec<_>>();
    assert_eq!(shown, vec!["e0", "e1"]);
  }

  #[test]
  fn exactly_max_events_all_fit() {
    let events = (0..3)
      .map(|idx| {
        CalendarEvent::new(
          format!("e{idx}"),
          "Event",
          at("2024-03-06 09:00"),
          at("2024-03-06 10:00")
        )
      })
      .collect::<Vec<_>>();
    let layout =
      layout_week(&events, week()[0]);
    let hidden = hidden_ids_for_week(
      &week(),
      &layout,
      3
    );
    assert!(hidden.is_empty());

    let day = day_visibility(
      date(6),
      &layout,
      &hidden,
      3
    );
    assert_eq!(day.visible.len(), 3);
    assert_eq!(day.hidden_count, 0);
  }

  #[test]
  fn hidden_event_is_hidden_on_every_day() {
    // Tuesday is crowded: the all-day
    // events claim the upper rows, so
    // "span" (Monday to Wednesday) lands
    // below them and overflows there.
    let mut events = vec![
      CalendarEvent::new(
        "span",
        "Span",
        at("2024-03-04 09:00"),
        at("2024-03-06 10:00")
      ),
    ];
    for idx in 0..3 {
      events.push(
        CalendarEvent::new(
          format!("holiday{idx}"),
          "Holiday",
          at("2024-03-05 00:00"),
          at("2024-03-05 00:00")
        )
        .with_all_day(true)
      );
    }

    let layout =
      layout_week(&events, week()[0]);
    let hidden = hidden_ids_for_week(
      &week(),
      &layout,
      3
    );
    assert!(hidden.contains("span"));

    let monday = day_visibility(
      date(4),
      &layout,
      &hidden,
      3
    );
    assert!(monday.visible.is_empty());
    assert_eq!(monday.hidden_count, 1);

    let tuesday = day_visibility(
      date(5),
      &layout,
      &hidden,
      3
    );
    assert_eq!(tuesday.visible.len(), 2);
    assert_eq!(tuesday.hidden_count, 2);
  }

  #[test]
  fn zero_rows_show_nothing() {
    let events = vec![CalendarEvent::new(
      "solo",
      "Solo",
      at("2024-03-06 09:00"),
      at("2024-03-06 10:00")
    )];
    let layout =
      layout_week(&events, week()[0]);
    let hidden = hidden_ids_for_week(
      &week(),
      &layout,
      0
    );
    let day = day_visibility(
      date(6),
      &layout,
      &hidden,
      0
    );
    assert!(day.visible.is_empty());
    assert_eq!(day.hidden_count, 1);
  }
}
