use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  Months,
  NaiveDate,
  NaiveDateTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const DEFAULT_TIMEZONE: &str =
  "UTC";

/// Week arithmetic anchored on a
/// configurable first weekday.
///
/// Every layout function receives one
/// of these explicitly, so the grid,
/// the slot window and the segment
/// continuation rule all agree on where
/// a week begins.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct WeekCalendar {
  week_start: Weekday
}

impl Default for WeekCalendar {
  fn default() -> Self {
    Self::new(Weekday::Sun)
  }
}

impl WeekCalendar {
  pub fn new(
    week_start: Weekday
  ) -> Self {
    Self { week_start }
  }

  pub fn week_start(&self) -> Weekday {
    self.week_start
  }

  pub fn start_of_week(
    &self,
    day: NaiveDate
  ) -> NaiveDate {
    add_days(
      day,
      -(self.weekday_index(day) as i64)
    )
  }

  pub fn end_of_week(
    &self,
    day: NaiveDate
  ) -> NaiveDate {
    add_days(
      self.start_of_week(day),
      6
    )
  }

  pub fn is_week_start(
    &self,
    day: NaiveDate
  ) -> bool {
    day.weekday() == self.week_start
  }

  /// Column of `day` inside its week,
  /// 0 for the week-start weekday.
  pub fn weekday_index(
    &self,
    day: NaiveDate
  ) -> usize {
    let day_idx = day
      .weekday()
      .num_days_from_monday();
    let start_idx = self
      .week_start
      .num_days_from_monday();
    ((7 + day_idx - start_idx) % 7)
      as usize
  }

  pub fn week_days(
    &self,
    day: NaiveDate
  ) -> [NaiveDate; 7] {
    let start = self.start_of_week(day);
    std::array::from_fn(|offset| {
      add_days(start, offset as i64)
    })
  }

  pub fn weekday_labels(
    &self
  ) -> [&'static str; 7] {
    let mut weekday = self.week_start;
    std::array::from_fn(|_| {
      let label =
        weekday_short_name(weekday);
      weekday = weekday.succ();
      label
    })
  }
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  checked_add_days(date, days)
    .unwrap_or(date)
}

/// `None` when the result would leave
/// the representable date range.
pub fn checked_add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  Duration::try_days(days).and_then(
    |delta| date.checked_add_signed(delta)
  )
}

/// Whole calendar days from `from` to
/// `to`; negative when `to` is earlier.
pub fn diff_days(
  from: NaiveDate,
  to: NaiveDate
) -> i64 {
  to.signed_duration_since(from)
    .num_days()
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  if month == 12 {
    return NaiveDate::from_ymd_opt(
      year, 12, 31
    );
  }
  NaiveDate::from_ymd_opt(
    year,
    month.checked_add(1)?,
    1
  )?
  .pred_opt()
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> Option<u32> {
  last_day_of_month(year, month)
    .map(|last| last.day())
}

/// Moves `date` by whole months, clamping
/// the day to the target month's length.
pub fn checked_shift_months(
  date: NaiveDate,
  months: i64
) -> Option<NaiveDate> {
  let step = Months::new(
    u32::try_from(months.unsigned_abs())
      .ok()?
  );
  if months < 0 {
    date.checked_sub_months(step)
  } else {
    date.checked_add_months(step)
  }
}

/// Like [`checked_shift_months`], but
/// keeps `date` when the target is out of
/// range.
pub fn shift_months(
  date: NaiveDate,
  months: i64
) -> NaiveDate {
  checked_shift_months(date, months)
    .unwrap_or_else(|| {
      tracing::warn!(
        %date,
        months,
        "month shift out of range; \
         keeping date"
      );
      date
    })
}

pub fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

pub fn weekday_short_name(
  weekday: Weekday
) -> &'static str {
  match weekday {
    | Weekday::Mon => "Mon",
    | Weekday::Tue => "Tue",
    | Weekday::Wed => "Wed",
    | Weekday::Thu => "Thu",
    | Weekday::Fri => "Fri",
    | Weekday::Sat => "Sat",
    | Weekday::Sun => "Sun"
  }
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  add_days(from, delta)
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "default"
  )
  .unwrap_or(chrono_tz::UTC)
}

pub fn today_in_timezone(
  timezone: Tz
) -> NaiveDate {
  Utc::now()
    .with_timezone(&timezone)
    .date_naive()
}

/// Resolves a user supplied focus date
/// relative to `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_reference_date(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" | "now" => {
      return Ok(today);
    }
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  if let Some(weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today, weekday
    ));
  }

  if let Some(month) =
    parse_month_name(&lower)
  {
    let year = if today.month() > month {
      today.year().saturating_add(1)
    } else {
      today.year()
    };
    return first_day_of_month(year, month)
      .ok_or_else(|| {
        anyhow!(
          "month {month} of {year} is out \
           of range"
        )
      });
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let num =
      if negative { -num } else { num };
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let shifted = match unit {
      | "d" => checked_add_days(today, num),
      | "w" => num
        .checked_mul(7)
        .and_then(|days| {
          checked_add_days(today, days)
        }),
      | "m" => {
        checked_shift_months(today, num)
      }
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    };
    return shifted.ok_or_else(|| {
      anyhow!(
        "relative offset {input} is out \
         of range"
      )
    });
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, weekday \
     names (e.g. monday), month names \
     (e.g. march), +Nd/-Nw/+Nm, \
     YYYY-MM-DD"
  })
}

/// Parses an event timestamp into the
/// wall clock of `timezone`.
pub fn parse_event_time(
  raw: &str,
  timezone: Tz
) -> anyhow::Result<NaiveDateTime> {
  let token = raw.trim();

  if let Ok(ndt) =
    NaiveDateTime::parse_from_str(
      token,
      "%Y%m%dT%H%M%SZ"
    )
  {
    let utc =
      DateTime::<Utc>::from_naive_utc_and_offset(
        ndt, Utc
      );
    return Ok(
      utc
        .with_timezone(&timezone)
        .naive_local()
    );
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(
      dt.with_timezone(&timezone)
        .naive_local()
    );
  }

  for fmt in [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M"
  ] {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(ndt);
    }
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return date
      .and_hms_opt(0, 0, 0)
      .ok_or_else(|| {
        anyhow!(
          "failed to construct \
           midnight for {token}"
        )
      });
  }

  Err(anyhow!(
    "unrecognized event time: {raw}"
  ))
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    Timelike,
    Weekday
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn start_of_week_honours_configured_weekday(
  ) {
    // 2024-03-06 is a Wednesday.
    let wednesday = date(2024, 3, 6);

    let sunday_first =
      WeekCalendar::new(Weekday::Sun);
    assert_eq!(
      sunday_first
        .start_of_week(wednesday),
      date(2024, 3, 3)
    );
    assert_eq!(
      sunday_first
        .weekday_index(wednesday),
      3
    );

    let monday_first =
      WeekCalendar::new(Weekday::Mon);
    assert_eq!(
      monday_first
        .start_of_week(wednesday),
      date(2024, 3, 4)
    );
    assert_eq!(
      monday_first.end_of_week(wednesday),
      date(2024, 3, 10)
    );
    assert!(
      monday_first
        .is_week_start(date(2024, 3, 4))
    );
  }

  #[test]
  fn week_start_day_is_its_own_start() {
    let calendar =
      WeekCalendar::new(Weekday::Sun);
    let sunday = date(2024, 3, 3);
    assert_eq!(
      calendar.start_of_week(sunday),
      sunday
    );
    assert_eq!(
      calendar.weekday_index(sunday),
      0
    );
  }

  #[test]
  fn weekday_labels_rotate_with_week_start(
  ) {
    let labels =
      WeekCalendar::new(Weekday::Sat)
        .weekday_labels();
    assert_eq!(
      labels,
      [
        "Sat", "Sun", "Mon", "Tue",
        "Wed", "Thu", "Fri"
      ]
    );
  }

  #[test]
  fn month_lengths_follow_calendar() {
    assert_eq!(
      days_in_month(2024, 2),
      Some(29)
    );
    assert_eq!(
      days_in_month(2023, 2),
      Some(28)
    );
    assert_eq!(
      days_in_month(1900, 2),
      Some(28)
    );
    assert_eq!(
      days_in_month(2000, 2),
      Some(29)
    );
    assert_eq!(
      last_day_of_month(2024, 12),
      Some(date(2024, 12, 31))
    );
    assert_eq!(
      days_in_month(2024, 13),
      None
    );
  }

  #[test]
  fn shift_months_clamps_day() {
    assert_eq!(
      shift_months(date(2024, 1, 31), 1),
      date(2024, 2, 29)
    );
    assert_eq!(
      shift_months(date(2024, 1, 15), -1),
      date(2023, 12, 15)
    );
  }

  #[test]
  fn month_helpers_reach_the_last_representable_month(
  ) {
    let max = NaiveDate::MAX;
    assert_eq!(
      last_day_of_month(
        max.year(),
        max.month()
      ),
      Some(max)
    );
    assert_eq!(
      first_day_of_month(
        max.year().saturating_add(1),
        1
      ),
      None
    );
  }

  #[test]
  fn huge_month_shifts_keep_the_date() {
    let today = date(2024, 3, 6);
    assert_eq!(
      shift_months(today, i64::MAX),
      today
    );
    assert_eq!(
      shift_months(today, i64::MIN),
      today
    );
    assert_eq!(
      checked_shift_months(
        today,
        i64::from(i32::MAX)
      ),
      None
    );
  }

  #[test]
  fn out_of_range_offsets_are_errors() {
    let today = date(2024, 3, 6);
    for input in [
      "+2147483647m",
      "-2147483647m",
      "+2000000000000000000w",
      "+9223372036854775807d",
      "-5000000000d"
    ] {
      let err = parse_reference_date(
        input, today
      )
      .expect_err("offset out of range");
      assert!(
        format!("{err:#}")
          .contains("out of range"),
        "{input}: {err:#}"
      );
    }
    assert!(
      parse_reference_date(
        "+99999999999999999999d",
        today
      )
      .is_err()
    );
  }

  #[test]
  fn parses_reference_keywords() {
    let today = date(2024, 3, 6);
    assert_eq!(
      parse_reference_date(
        "tomorrow", today
      )
      .expect("tomorrow"),
      date(2024, 3, 7)
    );
    assert_eq!(
      parse_reference_date(
        "friday", today
      )
      .expect("weekday"),
      date(2024, 3, 8)
    );
    assert_eq!(
      parse_reference_date(
        "wednesday",
        today
      )
      .expect("same weekday"),
      date(2024, 3, 13)
    );
  }

  #[test]
  fn parses_relative_offsets() {
    let today = date(2024, 3, 6);
    assert_eq!(
      parse_reference_date("-2w", today)
        .expect("weeks"),
      date(2024, 2, 21)
    );
    assert_eq!(
      parse_reference_date("+1m", today)
        .expect("months"),
      date(2024, 4, 6)
    );
    assert_eq!(
      parse_reference_date("+10d", today)
        .expect("days"),
      date(2024, 3, 16)
    );
  }

  #[test]
  fn parses_month_names_forward() {
    let today = date(2024, 3, 6);
    assert_eq!(
      parse_reference_date("jan", today)
        .expect("month"),
      date(2025, 1, 1)
    );
    assert_eq!(
      parse_reference_date(
        "march", today
      )
      .expect("current month"),
      date(2024, 3, 1)
    );
  }

  #[test]
  fn rejects_unknown_reference() {
    assert!(
      parse_reference_date(
        "someday",
        date(2024, 3, 6)
      )
      .is_err()
    );
  }

  #[test]
  fn event_time_accepts_local_and_offset_forms(
  ) {
    let tz: Tz = "America/New_York"
      .parse()
      .expect("valid tz");

    let local = parse_event_time(
      "2024-03-06T09:30",
      tz
    )
    .expect("local datetime");
    assert_eq!(local.hour(), 9);
    assert_eq!(local.minute(), 30);

    let date_only =
      parse_event_time("2024-03-06", tz)
        .expect("date only");
    assert_eq!(
      date_only.date(),
      date(2024, 3, 6)
    );
    assert_eq!(date_only.hour(), 0);

    let shifted = parse_event_time(
      "2024-03-06T02:00:00Z",
      tz
    )
    .expect("rfc3339");
    assert_eq!(
      shifted.date(),
      date(2024, 3, 5)
    );
    assert_eq!(shifted.hour(), 21);
  }
}
