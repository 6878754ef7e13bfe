//! Calendar boundary calculator
//!
//! Start/end instants of the local day, week, month and year containing a
//! reference instant. Every function is generic over the time zone so the
//! app can pass `Local` while tests pin a `FixedOffset`.
//!
//! Starts are local midnight (`00:00:00.000`), ends are `23:59:59.999` of the
//! last local day. Boundary dates are computed on the naive calendar first and
//! only then mapped back to an instant, so month lengths, leap years and DST
//! transitions never leak into the date arithmetic.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Week Start
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
  /// ISO weeks
  #[default]
  Monday,
  Sunday,
}

impl WeekStart {
  /// Days to step back from `weekday` to reach the first day of its week
  pub fn days_back(&self, weekday: Weekday) -> i64 {
    // 0 = Sunday .. 6 = Saturday
    let day = weekday.num_days_from_sunday() as i64;
    match self {
      WeekStart::Monday => {
        if day == 0 {
          6
        } else {
          day - 1
        }
      }
      WeekStart::Sunday => day,
    }
  }

  pub fn first_weekday(&self) -> Weekday {
    match self {
      WeekStart::Monday => Weekday::Mon,
      WeekStart::Sunday => Weekday::Sun,
    }
  }
}

impl std::fmt::Display for WeekStart {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Monday => write!(f, "monday"),
      Self::Sunday => write!(f, "sunday"),
    }
  }
}

impl std::str::FromStr for WeekStart {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "monday" => Ok(Self::Monday),
      "sunday" => Ok(Self::Sunday),
      _ => Err(format!("Unknown week start: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Calendar Arithmetic
/// ---------------------------------------------------------------------------

/// Gregorian rule: divisible by 4 and not by 100, unless divisible by 400
pub fn is_leap_year(year: i32) -> bool {
  (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1-12) of `year`; 0 for a month outside that range
pub fn days_in_month(year: i32, month: u32) -> u32 {
  match month {
    1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
    4 | 6 | 9 | 11 => 30,
    2 if is_leap_year(year) => 29,
    2 => 28,
    _ => 0,
  }
}

pub fn days_in_year(year: i32) -> u32 {
  if is_leap_year(year) {
    366
  } else {
    365
  }
}

/// ---------------------------------------------------------------------------
/// Local Time Resolution
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Edge {
  Start,
  End,
}

fn first_instant(date: NaiveDate) -> NaiveDateTime {
  date.and_time(NaiveTime::MIN)
}

fn last_instant(date: NaiveDate) -> NaiveDateTime {
  first_instant(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Map a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (clocks set back) pick the earlier instant for a start
/// and the later one for an end, so the period covers the whole repeated
/// hour. Times inside a spring-forward gap move forward by the gap length.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, edge: Edge) -> DateTime<Tz> {
  match tz.from_local_datetime(&local) {
    LocalResult::Single(dt) => dt,
    LocalResult::Ambiguous(earliest, latest) => match edge {
      Edge::Start => earliest,
      Edge::End => latest,
    },
    LocalResult::None => {
      let before_gap = tz.offset_from_utc_datetime(&(local - Duration::days(1))).fix();
      let utc = local - Duration::seconds(before_gap.local_minus_utc() as i64);
      tz.from_utc_datetime(&utc)
    }
  }
}

fn start_of<Tz: TimeZone>(t: &DateTime<Tz>, date: NaiveDate) -> DateTime<Tz> {
  resolve_local(&t.timezone(), first_instant(date), Edge::Start)
}

fn end_of<Tz: TimeZone>(t: &DateTime<Tz>, date: NaiveDate) -> DateTime<Tz> {
  resolve_local(&t.timezone(), last_instant(date), Edge::End)
}

/// ---------------------------------------------------------------------------
/// Boundaries
/// ---------------------------------------------------------------------------

pub fn start_of_day<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
  start_of(t, t.date_naive())
}

pub fn end_of_day<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
  end_of(t, t.date_naive())
}

fn first_day_of_week(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
  date - Duration::days(week_start.days_back(date.weekday()))
}

pub fn start_of_week<Tz: TimeZone>(t: &DateTime<Tz>, week_start: WeekStart) -> DateTime<Tz> {
  start_of(t, first_day_of_week(t.date_naive(), week_start))
}

/// Always the sixth day after the week's first day
pub fn end_of_week<Tz: TimeZone>(t: &DateTime<Tz>, week_start: WeekStart) -> DateTime<Tz> {
  let last = first_day_of_week(t.date_naive(), week_start) + Duration::days(6);
  end_of(t, last)
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
  date - Duration::days(date.day0() as i64)
}

pub fn start_of_month<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
  start_of(t, first_day_of_month(t.date_naive()))
}

pub fn end_of_month<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
  let date = t.date_naive();
  let length = days_in_month(date.year(), date.month()) as i64;
  end_of(t, first_day_of_month(date) + Duration::days(length - 1))
}

fn first_day_of_year(date: NaiveDate) -> NaiveDate {
  date - Duration::days(date.ordinal0() as i64)
}

pub fn start_of_year<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
  start_of(t, first_day_of_year(t.date_naive()))
}

pub fn end_of_year<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
  let date = t.date_naive();
  let length = days_in_year(date.year()) as i64;
  end_of(t, first_day_of_year(date) + Duration::days(length - 1))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
