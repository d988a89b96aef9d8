use chrono::{
  DateTime,
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;

use crate::model::Schedule;

pub const ISO_DAY_FORMAT: &str =
  "%Y-%m-%d";
pub const DISPLAY_DAY_FORMAT: &str =
  "%d.%m.%Y";
const DASHED_DAY_FORMAT: &str =
  "%d-%m-%Y";
pub const CLOCK_FORMAT: &str = "%H:%M";
pub const MONTH_GRID_DAYS: usize = 42;

const NAIVE_DATETIME_FORMATS: [&str;
  6] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M"
];

/// The two textual day keys used
/// across the views. `Iso` sorts
/// lexically; `Display` is what staff
/// off-days and pairing windows are
/// typed in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DayKeyFormat {
  Iso,
  Display
}

impl DayKeyFormat {
  fn pattern(self) -> &'static str {
    match self {
      | DayKeyFormat::Iso => {
        ISO_DAY_FORMAT
      }
      | DayKeyFormat::Display => {
        DISPLAY_DAY_FORMAT
      }
    }
  }

  #[must_use]
  pub fn format(
    self,
    date: NaiveDate
  ) -> String {
    date
      .format(self.pattern())
      .to_string()
  }

  pub fn parse(
    self,
    key: &str
  ) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(
      key.trim(),
      self.pattern()
    )
    .ok()
  }
}

/// Inclusive day sequence. Empty when
/// `start` is after `end`.
#[must_use]
pub fn enumerate_days(
  start: NaiveDate,
  end: NaiveDate
) -> Vec<NaiveDate> {
  if start > end {
    return Vec::new();
  }

  let span = (end - start).num_days();
  let mut days = Vec::with_capacity(
    usize::try_from(span + 1)
      .unwrap_or_default()
  );
  let mut current = Some(start);
  while let Some(day) = current {
    if day > end {
      break;
    }
    days.push(day);
    current = day.succ_opt();
  }
  days
}

#[must_use]
pub fn enumerate_day_keys(
  start: NaiveDate,
  end: NaiveDate,
  format: DayKeyFormat
) -> Vec<String> {
  enumerate_days(start, end)
    .into_iter()
    .map(|day| format.format(day))
    .collect()
}

/// Accepts ISO keys, display keys,
/// `DD-MM-YYYY`, or a full timestamp
/// (its UTC date).
pub fn parse_day(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  DayKeyFormat::Iso
    .parse(trimmed)
    .or_else(|| {
      DayKeyFormat::Display
        .parse(trimmed)
    })
    .or_else(|| {
      NaiveDate::parse_from_str(
        trimmed,
        DASHED_DAY_FORMAT
      )
      .ok()
    })
    .or_else(|| {
      parse_timestamp(trimmed)
        .map(|ts| ts.date_naive())
    })
}

/// RFC 3339, or a naive date-time read
/// as UTC, or a bare ISO date at
/// midnight UTC.
pub fn parse_timestamp(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(
      trimmed
    )
  {
    return Some(dt.with_timezone(&Utc));
  }

  for fmt in NAIVE_DATETIME_FORMATS {
    if let Ok(naive) =
      NaiveDateTime::parse_from_str(
        trimmed, fmt
      )
    {
      return Some(
        DateTime::<Utc>::from_naive_utc_and_offset(
          naive, Utc
        )
      );
    }
  }

  DayKeyFormat::Iso
    .parse(trimmed)
    .and_then(|date| {
      date.and_hms_opt(0, 0, 0)
    })
    .map(|naive| {
      DateTime::<Utc>::from_naive_utc_and_offset(
        naive, Utc
      )
    })
}

#[must_use]
pub fn to_display_date(
  ts: DateTime<Utc>,
  tz: Tz
) -> NaiveDate {
  ts.with_timezone(&tz).date_naive()
}

/// Day on which a raw timestamp falls
/// in the display timezone.
pub fn timestamp_day(
  raw: &str,
  tz: Tz
) -> Option<NaiveDate> {
  parse_timestamp(raw)
    .map(|ts| to_display_date(ts, tz))
}

#[must_use]
pub fn format_clock(
  raw: &str,
  tz: Tz
) -> String {
  parse_timestamp(raw)
    .map(|ts| {
      ts.with_timezone(&tz)
        .format(CLOCK_FORMAT)
        .to_string()
    })
    .unwrap_or_else(|| {
      "N/A".to_string()
    })
}

/// RFC 3339 in UTC with millisecond
/// precision.
#[must_use]
pub fn format_timestamp(
  ts: DateTime<Utc>
) -> String {
  ts.to_rfc3339_opts(
    chrono::SecondsFormat::Millis,
    true
  )
}

pub fn is_within_schedule_range(
  date: NaiveDate,
  schedule: &Schedule
) -> bool {
  schedule
    .valid_window()
    .map(|(start, end)| {
      start <= date && date <= end
    })
    .unwrap_or(false)
}

#[must_use]
pub fn first_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

#[must_use]
pub fn last_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  add_days(
    first_day_of_month(shift_months(
      first_day_of_month(date),
      1
    )),
    -1
  )
}

#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let mut day = date.day();
  loop {
    if let Some(shifted) =
      NaiveDate::from_ymd_opt(
        year, month, day
      )
    {
      return shifted;
    }
    if day <= 28 {
      return date;
    }
    day -= 1;
  }
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

/// Six full weeks covering the month
/// of `focus`.
#[must_use]
pub fn month_grid(
  focus: NaiveDate,
  week_start: Weekday
) -> Vec<NaiveDate> {
  let first = start_of_week(
    first_day_of_month(focus),
    week_start
  );
  let last = add_days(
    first,
    MONTH_GRID_DAYS as i64 - 1
  );
  enumerate_days(first, last)
}

pub fn parse_week_start(
  raw: &str
) -> Weekday {
  if raw
    .trim()
    .eq_ignore_ascii_case("sunday")
  {
    Weekday::Sun
  } else {
    Weekday::Mon
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn enumerate_days_is_inclusive_and_increasing(
  ) {
    let days = enumerate_days(
      day(2024, 2, 27),
      day(2024, 3, 2)
    );
    assert_eq!(days.len(), 5);
    assert_eq!(days[0], day(2024, 2, 27));
    assert_eq!(days[2], day(2024, 2, 29));
    assert_eq!(
      days.last().copied(),
      Some(day(2024, 3, 2))
    );
    assert!(
      days.windows(2).all(|w| w[0] < w[1])
    );
  }

  #[test]
  fn enumerate_days_single_day() {
    let days = enumerate_days(
      day(2024, 1, 5),
      day(2024, 1, 5)
    );
    assert_eq!(days, vec![day(
      2024, 1, 5
    )]);
  }

  #[test]
  fn enumerate_days_reversed_range_is_empty(
  ) {
    assert!(
      enumerate_days(
        day(2024, 1, 6),
        day(2024, 1, 5)
      )
      .is_empty()
    );
  }

  #[test]
  fn day_keys_round_trip_between_formats(
  ) {
    let keys = enumerate_day_keys(
      day(2024, 12, 31),
      day(2025, 1, 1),
      DayKeyFormat::Display
    );
    assert_eq!(keys, vec![
      "31.12.2024".to_string(),
      "01.01.2025".to_string()
    ]);

    for key in keys {
      let parsed = DayKeyFormat::Display
        .parse(&key)
        .expect("display key parses");
      let iso =
        DayKeyFormat::Iso.format(parsed);
      assert_eq!(
        DayKeyFormat::Iso.parse(&iso),
        Some(parsed)
      );
    }
  }

  #[test]
  fn parse_day_accepts_every_known_format(
  ) {
    let expected = day(2024, 1, 7);
    for raw in [
      "2024-01-07",
      "07.01.2024",
      "07-01-2024",
      "2024-01-07T10:00:00Z",
      "2024-01-07T10:00"
    ] {
      assert_eq!(
        parse_day(raw),
        Some(expected),
        "{raw}"
      );
    }
    assert_eq!(parse_day(""), None);
    assert_eq!(parse_day("soon"), None);
  }

  #[test]
  fn parse_timestamp_reads_naive_values_as_utc(
  ) {
    let ts = parse_timestamp(
      "2024-01-05T08:30:00"
    )
    .expect("naive timestamp");
    assert_eq!(
      format_timestamp(ts),
      "2024-01-05T08:30:00.000Z"
    );
    assert!(
      parse_timestamp("not a date")
        .is_none()
    );
  }

  #[test]
  fn timestamp_day_respects_display_timezone(
  ) {
    let tz: Tz = "Asia/Tokyo"
      .parse()
      .expect("valid tz");
    assert_eq!(
      timestamp_day(
        "2024-01-31T20:00:00Z",
        tz
      ),
      Some(day(2024, 2, 1))
    );
    assert_eq!(
      format_clock(
        "2024-01-31T20:00:00Z",
        chrono_tz::UTC
      ),
      "20:00"
    );
    assert_eq!(
      format_clock("??", chrono_tz::UTC),
      "N/A"
    );
  }

  #[test]
  fn shift_months_clamps_day_of_month() {
    assert_eq!(
      shift_months(day(2024, 1, 31), 1),
      day(2024, 2, 29)
    );
    assert_eq!(
      shift_months(day(2024, 1, 15), -1),
      day(2023, 12, 15)
    );
    assert_eq!(
      last_day_of_month(day(2023, 2, 10)),
      day(2023, 2, 28)
    );
  }

  #[test]
  fn month_grid_starts_on_week_start() {
    let grid = month_grid(
      day(2024, 1, 17),
      Weekday::Mon
    );
    assert_eq!(grid.len(), MONTH_GRID_DAYS);
    assert_eq!(grid[0], day(2024, 1, 1));

    let sunday_grid = month_grid(
      day(2024, 1, 17),
      Weekday::Sun
    );
    assert_eq!(
      sunday_grid[0],
      day(2023, 12, 31)
    );
  }
}
