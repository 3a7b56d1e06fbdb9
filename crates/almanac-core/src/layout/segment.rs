use chrono::NaiveDate;
use serde::Serialize;

use crate::datetime::{
  WeekCalendar,
  add_days,
  diff_days
};
use crate::event::CalendarEvent;

/// How a segment continues across week
/// rows.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum MultiWeek {
  /// Started in an earlier week and ends
  /// in a later one.
  Both,
  /// Started in an earlier week, ends in
  /// this one.
  Previous,
  /// Starts in this week, ends in a
  /// later one.
  Next
}

impl MultiWeek {
  pub fn continues_from_previous(
    self
  ) -> bool {
    matches!(
      self,
      MultiWeek::Both
        | MultiWeek::Previous
    )
  }

  pub fn continues_to_next(
    self
  ) -> bool {
    matches!(
      self,
      MultiWeek::Both | MultiWeek::Next
    )
  }
}

/// Draw instructions for one event on
/// one day cell.
///
/// `left` and `width` are percentages of
/// the 7-column week row. `column` and
/// `span` carry the same placement in
/// whole columns.
#[derive(
  Debug, Clone, Copy, Serialize, PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
  pub show:         bool,
  pub left:         f64,
  pub width:        f64,
  pub column:       usize,
  pub span:         usize,
  pub is_start_day: bool,
  pub is_multi_day: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub multi_week:   Option<MultiWeek>
}

/// Decides whether `event` starts a
/// visible segment on `cell_date` and
/// where that segment sits in its week.
///
/// A segment is drawn on the event's own
/// start day and on the first day of
/// every later week it is still running
/// in, so each week row carries exactly
/// one label for the event.
pub fn segment_info(
  event: &CalendarEvent,
  cell_date: NaiveDate,
  calendar: &WeekCalendar
) -> SegmentInfo {
  let start_day = event.start_day();
  let end_day = event.end_day();
  let week_start =
    calendar.start_of_week(cell_date);
  let week_end = add_days(week_start, 6);

  let is_start_day =
    cell_date == start_day;
  let continues_here = calendar
    .is_week_start(cell_date)
    && start_day < cell_date
    && end_day >= cell_date;
  let show = is_start_day
    || continues_here;

  let multi_week = classify_multi_week(
    calendar.start_of_week(start_day),
    calendar.start_of_week(end_day),
    week_start
  );

  if !show {
    return SegmentInfo {
      show: false,
      left: 0.0,
      width: 0.0,
      column: 0,
      span: 0,
      is_start_day,
      is_multi_day: event.is_multi_day(),
      multi_week
    };
  }

  let clipped_start =
    start_day.max(week_start);
  let clipped_end =
    end_day.min(week_end);
  let column =
    calendar.weekday_index(clipped_start);
  let span = (diff_days(
    clipped_start,
    clipped_end
  ) + 1)
    .max(0) as usize;

  SegmentInfo {
    show,
    left: column as f64 / 7.0 * 100.0,
    width: span as f64 / 7.0 * 100.0,
    column,
    span,
    is_start_day,
    is_multi_day: event.is_multi_day(),
    multi_week
  }
}

fn classify_multi_week(
  start_week: NaiveDate,
  end_week: NaiveDate,
  cell_week: NaiveDate
) -> Option<MultiWeek> {
  if start_week < cell_week
    && cell_week < end_week
  {
    Some(MultiWeek::Both)
  } else if start_week < cell_week
    && cell_week == end_week
  {
    Some(MultiWeek::Previous)
  } else if start_week == cell_week
    && cell_week < end_week
  {
    Some(MultiWeek::Next)
  } else {
    None
  }
}
