use chrono::{
  Datelike,
  NaiveDate
};
use serde::Serialize;

use crate::datetime::{
  WeekCalendar,
  checked_add_days,
  diff_days,
  first_day_of_month,
  last_day_of_month
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
  pub date:             NaiveDate,
  pub is_current_month: bool,
  pub is_today:         bool
}

pub type Week = [CalendarCell; 7];

#[derive(
  Debug, Clone, Serialize, PartialEq, Eq,
)]
pub struct MonthGrid {
  pub year:  i32,
  pub month: u32,
  pub weeks: Vec<Week>
}

impl MonthGrid {
  pub fn cells(
    &self
  ) -> impl Iterator<Item = &CalendarCell>
  {
    self.weeks.iter().flatten()
  }
}

/// The 7 days of the week containing
/// `reference`. Every cell counts as
/// belonging to the displayed period.
pub fn build_week(
  reference: NaiveDate,
  today: NaiveDate,
  calendar: &WeekCalendar
) -> Week {
  calendar.week_days(reference).map(
    |date| CalendarCell {
      date,
      is_current_month: true,
      is_today: date == today
    }
  )
}

#[tracing::instrument(skip(calendar))]
pub fn build_month_grid(
  reference: NaiveDate,
  today: NaiveDate,
  calendar: &WeekCalendar
) -> MonthGrid {
  let year = reference.year();
  let month = reference.month();
  let bounds = first_day_of_month(
    year, month
  )
  .zip(last_day_of_month(year, month))
  .and_then(|(first, last)| {
    let start = checked_add_days(
      first,
      -(calendar.weekday_index(first)
        as i64)
    )?;
    let end = checked_add_days(
      last,
      6 - calendar.weekday_index(last)
        as i64
    )?;
    Some((start, end))
  });
  let Some((grid_start, grid_end)) =
    bounds
  else {
    tracing::error!(
      %reference,
      "month grid falls outside the \
       supported date range"
    );
    return MonthGrid {
      year,
      month,
      weeks: Vec::new()
    };
  };

  let total_days =
    diff_days(grid_start, grid_end) + 1;
  let mut weeks = Vec::with_capacity(
    (total_days / 7).max(0) as usize
  );
  let mut week_start = Some(grid_start);
  while let Some(start) = week_start
    && start <= grid_end
  {
    weeks.push(
      calendar.week_days(start).map(
        |date| CalendarCell {
          date,
          is_current_month: date.year()
            == year
            && date.month() == month,
          is_today: date == today
        }
      )
    );
    week_start =
      checked_add_days(start, 7);
  }

  let well_formed = total_days % 7 == 0
    && (4..=6).contains(&weeks.len());
  if !well_formed {
    tracing::error!(
      %reference,
      total_days,
      weeks = weeks.len(),
      "month grid has an invalid shape"
    );
  }
  debug_assert!(
    well_formed,
    "month grid for {reference} spans \
     {total_days} days in {} weeks",
    weeks.len()
  );

  MonthGrid { year, month, weeks }
}
