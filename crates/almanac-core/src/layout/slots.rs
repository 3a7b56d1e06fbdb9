use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::datetime::{
  add_days,
  diff_days
};
use crate::event::{
  CalendarEvent,
  layout_priority
};
use crate::layout::membership::events_in_window;

/// An event with the row it occupies in
/// one particular week.
///
/// `cell_slot` is local to the week it
/// was computed for; the same event may
/// sit on another row in the next week.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct SlottedEvent<'a> {
  pub event:     &'a CalendarEvent,
  pub cell_slot: usize
}

/// Assigns rows to every event touching
/// the 7 days starting at `week_start`.
///
/// Events are taken in
/// [`layout_priority`] order and each one
/// gets the lowest row that is free on
/// every day it covers inside the
/// window, so spanning events settle on
/// top and single-day events pack into
/// the gaps below.
#[tracing::instrument(skip(events), fields(events = events.len()))]
pub fn layout_week<'a>(
  events: &'a [CalendarEvent],
  week_start: NaiveDate
) -> Vec<SlottedEvent<'a>> {
  let week_end = add_days(week_start, 6);
  let mut ordered = events_in_window(
    week_start, week_end, events
  );
  ordered.sort_by(|a, b| {
    layout_priority(a, b)
  });

  let mut occupied: [BTreeSet<usize>;
    7] = Default::default();
  let mut slotted =
    Vec::with_capacity(ordered.len());

  for event in ordered {
    let first = diff_days(
      week_start,
      event.start_day().max(week_start)
    )
    .clamp(0, 6) as usize;
    let last = diff_days(
      week_start,
      event.end_day().min(week_end)
    )
    .clamp(0, 6) as usize;
    let days = first..=last.max(first);

    let mut slot = 0;
    while days
      .clone()
      .any(|idx| {
        occupied[idx].contains(&slot)
      })
    {
      slot += 1;
    }
    for idx in days {
      occupied[idx].insert(slot);
    }

    slotted.push(SlottedEvent {
      event,
      cell_slot: slot
    });
  }

  tracing::debug!(
    %week_start,
    placed = slotted.len(),
    rows = slotted
      .iter()
      .map(|entry| entry.cell_slot + 1)
      .max()
      .unwrap_or(0),
    "week slots assigned"
  );
  slotted
}

/// Slot of `id` in a week layout, if the
/// event appears in that week.
pub fn slot_of(
  layout: &[SlottedEvent<'_>],
  id: &str
) -> Option<usize> {
  layout
    .iter()
    .find(|entry| entry.event.id == id)
    .map(|entry| entry.cell_slot)
}
