use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::datetime::{
  WeekCalendar,
  add_days,
  shift_months
};
use crate::event::{
  CalendarEvent,
  day_listing_order
};
use crate::layout::membership::events_on_day;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  ValueEnum,
  Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  Month,
  Week,
  Day,
  Agenda
}

impl ViewMode {
  pub fn as_key(self) -> &'static str {
    match self {
      | ViewMode::Month => "month",
      | ViewMode::Week => "week",
      | ViewMode::Day => "day",
      | ViewMode::Agenda => "agenda"
    }
  }

  pub fn from_key(
    raw: &str
  ) -> Option<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "month" => Some(ViewMode::Month),
      | "week" => Some(ViewMode::Week),
      | "day" => Some(ViewMode::Day),
      | "agenda" => {
        Some(ViewMode::Agenda)
      }
      | _ => None
    }
  }
}

/// Moves the focus date by `step`
/// periods of `view`. The agenda pages
/// by `agenda_days`.
pub fn shift_focus(
  current: NaiveDate,
  view: ViewMode,
  step: i64,
  agenda_days: u32
) -> NaiveDate {
  match view {
    | ViewMode::Month => {
      shift_months(current, step)
    }
    | ViewMode::Week => {
      add_days(
        current,
        step.saturating_mul(7)
      )
    }
    | ViewMode::Day => {
      add_days(current, step)
    }
    | ViewMode::Agenda => {
      add_days(
        current,
        step.saturating_mul(i64::from(
          agenda_days
        ))
      )
    }
  }
}

pub fn view_title(
  view: ViewMode,
  focus: NaiveDate,
  calendar: &WeekCalendar,
  agenda_days: u32
) -> String {
  match view {
    | ViewMode::Month => {
      format!(
        "Month View {}",
        focus.format("%B %Y")
      )
    }
    | ViewMode::Week => {
      let start =
        calendar.start_of_week(focus);
      let end = add_days(start, 6);
      format!(
        "Week View {} - {}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
      )
    }
    | ViewMode::Day => {
      format!(
        "Day View {}",
        focus.format("%A, %Y-%m-%d")
      )
    }
    | ViewMode::Agenda => {
      let end = add_days(
        focus,
        i64::from(agenda_days.max(1)) - 1
      );
      format!(
        "Agenda {} - {}",
        focus.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
      )
    }
  }
}

#[derive(
  Debug, Clone, Serialize, PartialEq, Eq,
)]
pub struct AgendaDay<'a> {
  pub date:   NaiveDate,
  pub events: Vec<&'a CalendarEvent>
}

/// Events of one day, all-day first and
/// then by start time.
pub fn day_events<'a>(
  events: &'a [CalendarEvent],
  day: NaiveDate
) -> Vec<&'a CalendarEvent> {
  let mut listed =
    events_on_day(day, events);
  listed.sort_by(|a, b| {
    day_listing_order(a, b)
  });
  listed
}

/// Days in `from..from + days` that hold
/// at least one event.
#[tracing::instrument(skip(events), fields(events = events.len()))]
pub fn agenda<'a>(
  events: &'a [CalendarEvent],
  from: NaiveDate,
  days: u32
) -> Vec<AgendaDay<'a>> {
  let entries = (0..i64::from(days))
    .map(|offset| add_days(from, offset))
    .filter_map(|date| {
      let listed =
        day_events(events, date);
      (!listed.is_empty()).then_some(
        AgendaDay {
          date,
          events: listed
        }
      )
    })
    .collect::<Vec<_>>();

  tracing::debug!(
    %from,
    days,
    busy_days = entries.len(),
    "agenda collected"
  );
  entries
}
