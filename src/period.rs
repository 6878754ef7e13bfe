//! Period progress facade
//!
//! Picks the interval for a period kind (calendar boundaries or a custom
//! range) and normalizes it. Display inversion happens last and only touches
//! the percent.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{
  end_of_day, end_of_month, end_of_week, end_of_year, start_of_day, start_of_month,
  start_of_week, start_of_year, WeekStart,
};
use crate::models::Timer;
use crate::progress::{calculate_progress, DisplayMode, Progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
  Day,
  Week,
  Month,
  Year,
  Custom,
}

impl PeriodKind {
  pub const CALENDAR: [PeriodKind; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Day => "day",
      Self::Week => "week",
      Self::Month => "month",
      Self::Year => "year",
      Self::Custom => "custom",
    }
  }

  /// Title-cased label used for default timer names
  pub fn label(&self) -> &'static str {
    match self {
      Self::Day => "Day",
      Self::Week => "Week",
      Self::Month => "Month",
      Self::Year => "Year",
      Self::Custom => "Custom",
    }
  }
}

impl std::fmt::Display for PeriodKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for PeriodKind {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "day" => Ok(Self::Day),
      "week" => Ok(Self::Week),
      "month" => Ok(Self::Month),
      "year" => Ok(Self::Year),
      "custom" => Ok(Self::Custom),
      _ => Err(format!("Unknown period kind: {}", s)),
    }
  }
}

/// User-chosen range; either side may still be missing while editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomInterval {
  pub start: Option<DateTime<Utc>>,
  pub end: Option<DateTime<Utc>>,
}

impl CustomInterval {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self {
      start: Some(start),
      end: Some(end),
    }
  }

  pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((self.start?, self.end?))
  }
}

/// Calendar interval for `kind` around `now`; `None` for custom periods
pub fn period_bounds<Tz: TimeZone>(
  kind: PeriodKind,
  now: &DateTime<Tz>,
  week_start: WeekStart,
) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
  match kind {
    PeriodKind::Day => Some((start_of_day(now), end_of_day(now))),
    PeriodKind::Week => Some((start_of_week(now, week_start), end_of_week(now, week_start))),
    PeriodKind::Month => Some((start_of_month(now), end_of_month(now))),
    PeriodKind::Year => Some((start_of_year(now), end_of_year(now))),
    PeriodKind::Custom => None,
  }
}

/// Raw progress for a period. A custom period without both dates yields
/// the all-zero not-started record.
pub fn period_progress<Tz: TimeZone>(
  kind: PeriodKind,
  now: &DateTime<Tz>,
  week_start: WeekStart,
  custom: Option<&CustomInterval>,
) -> Progress {
  if kind == PeriodKind::Custom {
    return match custom.and_then(CustomInterval::bounds) {
      Some((start, end)) => calculate_progress(now, &start, &end),
      None => Progress::unset(),
    };
  }

  match period_bounds(kind, now, week_start) {
    Some((start, end)) => calculate_progress(now, &start, &end),
    None => Progress::unset(),
  }
}

/// [`period_progress`] oriented for display
pub fn display_progress<Tz: TimeZone>(
  kind: PeriodKind,
  now: &DateTime<Tz>,
  week_start: WeekStart,
  custom: Option<&CustomInterval>,
  mode: DisplayMode,
) -> Progress {
  period_progress(kind, now, week_start, custom).for_display(mode)
}

pub fn day_progress<Tz: TimeZone>(now: &DateTime<Tz>) -> Progress {
  period_progress(PeriodKind::Day, now, WeekStart::default(), None)
}

pub fn week_progress<Tz: TimeZone>(now: &DateTime<Tz>, week_start: WeekStart) -> Progress {
  period_progress(PeriodKind::Week, now, week_start, None)
}

pub fn month_progress<Tz: TimeZone>(now: &DateTime<Tz>) -> Progress {
  period_progress(PeriodKind::Month, now, WeekStart::default(), None)
}

pub fn year_progress<Tz: TimeZone>(now: &DateTime<Tz>) -> Progress {
  period_progress(PeriodKind::Year, now, WeekStart::default(), None)
}

/// Raw progress for a stored timer
pub fn timer_raw_progress<Tz: TimeZone>(timer: &Timer, week_start: WeekStart, now: &DateTime<Tz>) -> Progress {
  period_progress(timer.timer_type, now, week_start, Some(&timer.custom_interval()))
}

/// Progress for a stored timer, inverted when it is shown as "remaining"
pub fn timer_progress<Tz: TimeZone>(timer: &Timer, week_start: WeekStart, now: &DateTime<Tz>) -> Progress {
  timer_raw_progress(timer, week_start, now).for_display(timer.effective_mode())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::progress::ProgressStatus;
  use crate::test_utils::{mock_custom_timer, mock_period_timer};
  use chrono::{Duration, FixedOffset};

  fn noon(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  #[test]
  fn test_day_progress_at_noon_is_about_half() {
    let progress = day_progress(&noon(2024, 6, 15));
    assert_eq!(progress.status, ProgressStatus::InProgress);
    // end is 23:59:59.999 so noon sits a hair past 50%
    crate::assert_approx_eq!(progress.percent, 50.0, 0.001);
  }

  #[test]
  fn test_week_progress_depends_on_week_start() {
    // Sunday noon
    let now = noon(2024, 6, 23);
    let monday = week_progress(&now, WeekStart::Monday);
    let sunday = week_progress(&now, WeekStart::Sunday);
    assert!(monday.percent > 90.0);
    assert!(sunday.percent < 10.0);
  }

  #[test]
  fn test_month_progress_february_leap_year() {
    let progress = month_progress(&noon(2024, 2, 15));
    let expected_total = 29 * 86_400_000 - 1;
    assert_eq!(progress.total_ms, expected_total);
  }

  #[test]
  fn test_year_progress_first_instant_is_zero() {
    let new_year = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let progress = year_progress(&new_year);
    assert_eq!(progress.percent, 0.0);
    assert_eq!(progress.status, ProgressStatus::InProgress);
  }

  #[test]
  fn test_custom_without_dates_is_unset() {
    let now = noon(2024, 1, 1);
    let progress = period_progress(PeriodKind::Custom, &now, WeekStart::Monday, None);
    assert_eq!(progress, Progress::unset());

    let half = CustomInterval {
      start: Some(Utc::now()),
      end: None,
    };
    let progress = period_progress(PeriodKind::Custom, &now, WeekStart::Monday, Some(&half));
    assert_eq!(progress.status, ProgressStatus::NotStarted);
    assert_eq!(progress.total_ms, 0);
  }

  #[test]
  fn test_custom_interval_progress() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let interval = CustomInterval::new(start, start + Duration::days(10));
    let now = start + Duration::days(5);

    let progress = period_progress(PeriodKind::Custom, &now, WeekStart::Monday, Some(&interval));
    assert_eq!(progress.percent, 50.0);

    let shown = display_progress(
      PeriodKind::Custom,
      &(start + Duration::days(2)),
      WeekStart::Monday,
      Some(&interval),
      DisplayMode::Remaining,
    );
    assert_eq!(shown.percent, 80.0);
    assert_eq!(shown.remaining_ms, 8 * 86_400_000);
  }

  #[test]
  fn test_period_bounds_custom_is_none() {
    assert!(period_bounds(PeriodKind::Custom, &noon(2024, 1, 1), WeekStart::Monday).is_none());
    assert!(period_bounds(PeriodKind::Week, &noon(2024, 1, 1), WeekStart::Monday).is_some());
  }

  #[test]
  fn test_timer_progress_uses_view_mode() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut timer = mock_custom_timer("Sabbatical", start, start + Duration::days(4));
    let now = start + Duration::days(1);

    assert_eq!(timer_progress(&timer, WeekStart::Monday, &now).percent, 25.0);

    timer.view_mode = Some(DisplayMode::Remaining);
    assert_eq!(timer_progress(&timer, WeekStart::Monday, &now).percent, 75.0);
    assert_eq!(timer_raw_progress(&timer, WeekStart::Monday, &now).percent, 25.0);
  }

  #[test]
  fn test_calendar_timer_ignores_stray_dates() {
    let mut timer = mock_period_timer(PeriodKind::Day);
    timer.start_date = Some(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap());
    let now = noon(2024, 6, 15);
    assert_eq!(
      timer_progress(&timer, WeekStart::Monday, &now),
      day_progress(&now)
    );
  }

  #[test]
  fn test_period_kind_parse() {
    assert_eq!("month".parse::<PeriodKind>(), Ok(PeriodKind::Month));
    assert!("life".parse::<PeriodKind>().is_err());
    assert_eq!(PeriodKind::Week.label(), "Week");
  }
}
