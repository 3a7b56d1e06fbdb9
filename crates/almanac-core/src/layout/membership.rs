use chrono::NaiveDate;

use crate::event::CalendarEvent;

/// Events occupying `day`, compared by
/// calendar date on both endpoints.
pub fn events_on_day<'a>(
  day: NaiveDate,
  events: &'a [CalendarEvent]
) -> Vec<&'a CalendarEvent> {
  events
    .iter()
    .filter(|event| event.occupies(day))
    .collect()
}

/// Events touching any day of
/// `from..=to`.
pub fn events_in_window<'a>(
  from: NaiveDate,
  to: NaiveDate,
  events: &'a [CalendarEvent]
) -> Vec<&'a CalendarEvent> {
  events
    .iter()
    .filter(|event| {
      event.intersects(from, to)
    })
    .collect()
}
