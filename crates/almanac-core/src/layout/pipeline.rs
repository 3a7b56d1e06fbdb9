use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::datetime::WeekCalendar;
use crate::event::{
  CalendarEvent,
  EventColor
};
use crate::layout::grid::{
  CalendarCell,
  Week,
  build_month_grid,
  build_week
};
use crate::layout::segment::{
  SegmentInfo,
  segment_info
};
use crate::layout::slots::layout_week;
use crate::layout::visibility::{
  day_visibility,
  hidden_ids_for_week
};

/// A visible segment anchored on the
/// cell where it starts in this week.
#[derive(
  Debug, Clone, Serialize, PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct PlacedSegment {
  pub event_id: String,
  pub title:    String,
  pub slot:     usize,
  pub all_day:  bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color:    Option<EventColor>,
  pub geometry: SegmentInfo
}

#[derive(
  Debug, Clone, Serialize, PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct DayLayout {
  pub cell:              CalendarCell,
  pub segments:          Vec<PlacedSegment>,
  pub visible_event_ids: Vec<String>,
  pub hidden_count:      usize
}

#[derive(
  Debug, Clone, Serialize, PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct WeekLayout {
  pub week_start: NaiveDate,
  pub days:       Vec<DayLayout>,
  /// Rows occupied by visible segments.
  pub rows:       usize
}

impl WeekLayout {
  pub fn segments(
    &self
  ) -> impl Iterator<Item = &PlacedSegment>
  {
    self
      .days
      .iter()
      .flat_map(|day| day.segments.iter())
  }
}

#[derive(
  Debug, Clone, Serialize, PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct MonthLayout {
  pub year:           i32,
  pub month:          u32,
  pub weekday_labels: [&'static str; 7],
  pub weeks:          Vec<WeekLayout>
}

/// Runs slots, overflow and geometry for
/// one displayed week row.
pub fn layout_week_row(
  events: &[CalendarEvent],
  week: &Week,
  calendar: &WeekCalendar,
  max_visible: usize
) -> WeekLayout {
  let week_start = week[0].date;
  let slotted =
    layout_week(events, week_start);
  let week_days =
    week.map(|cell| cell.date);
  let hidden = hidden_ids_for_week(
    &week_days,
    &slotted,
    max_visible
  );

  let days = week
    .iter()
    .map(|cell| {
      let visibility = day_visibility(
        cell.date,
        &slotted,
        &hidden,
        max_visible
      );
      let segments = visibility
        .visible
        .iter()
        .filter_map(|entry| {
          let geometry = segment_info(
            entry.event,
            cell.date,
            calendar
          );
          geometry.show.then(|| {
            PlacedSegment {
              event_id: entry
                .event
                .id
                .clone(),
              title: entry
                .event
                .title
                .clone(),
              slot: entry.cell_slot,
              all_day: entry
                .event
                .all_day,
              color: entry.event.color,
              geometry
            }
          })
        })
        .collect::<Vec<_>>();

      DayLayout {
        cell: *cell,
        segments,
        visible_event_ids: visibility
          .visible
          .iter()
          .map(|entry| {
            entry.event.id.clone()
          })
          .collect(),
        hidden_count: visibility
          .hidden_count
      }
    })
    .collect::<Vec<_>>();

  let rows = days
    .iter()
    .flat_map(|day| day.segments.iter())
    .map(|segment| segment.slot + 1)
    .max()
    .unwrap_or(0);

  WeekLayout {
    week_start,
    days,
    rows
  }
}

#[tracing::instrument(skip(events, calendar), fields(events = events.len()))]
pub fn layout_month(
  events: &[CalendarEvent],
  reference: NaiveDate,
  today: NaiveDate,
  calendar: &WeekCalendar,
  max_visible: usize
) -> MonthLayout {
  let grid = build_month_grid(
    reference, today, calendar
  );
  let weeks = grid
    .weeks
    .iter()
    .map(|week| {
      layout_week_row(
        events,
        week,
        calendar,
        max_visible
      )
    })
    .collect::<Vec<_>>();

  tracing::debug!(
    year = grid.year,
    month = grid.month,
    weeks = weeks.len(),
    hidden = weeks
      .iter()
      .flat_map(|week| week.days.iter())
      .map(|day| day.hidden_count)
      .sum::<usize>(),
    "month laid out"
  );

  MonthLayout {
    year: grid.year,
    month: grid.month,
    weekday_labels: calendar
      .weekday_labels(),
    weeks
  }
}

#[tracing::instrument(skip(events, calendar), fields(events = events.len()))]
pub fn layout_week_view(
  events: &[CalendarEvent],
  reference: NaiveDate,
  today: NaiveDate,
  calendar: &WeekCalendar,
  max_visible: usize
) -> WeekLayout {
  let week =
    build_week(reference, today, calendar);
  layout_week_row(
    events,
    &week,
    calendar,
    max_visible
  )
}

/// Ids of events whose segments would be
/// drawn somewhere in the month.
pub fn placed_event_ids(
  layout: &MonthLayout
) -> BTreeSet<&str> {
  layout
    .weeks
    .iter()
    .flat_map(|week| week.segments())
    .map(|segment| {
      segment.event_id.as_str()
    })
    .collect()
}
