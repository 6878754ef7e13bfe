//! Life progress
//!
//! Places "now" between a birth date and an estimated lifespan. Shares the
//! [`Progress`] shape with calendar periods so the same display code can
//! render it.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::life_expectancy::LifeExpectancyEstimate;
use crate::models::LifeTimer;
use crate::progress::{clamp, Progress, ProgressStatus};

const DAYS_PER_YEAR: f64 = 365.25;
const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_YEAR: f64 = DAYS_PER_YEAR * MS_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeProgress {
  #[serde(flatten)]
  pub progress: Progress,
  pub estimated_lifespan: f64,
  pub range_min: f64,
  pub range_max: f64,
  pub years_lived: f64,
  pub years_remaining: f64,
  pub months_remaining: i64,
  pub days_remaining: i64,
}

/// Fractional years between birth and `now` on a 365.25-day year, never negative
pub fn precise_age<B: TimeZone, N: TimeZone>(birth: &DateTime<B>, now: &DateTime<N>) -> f64 {
  let lived_ms = now.timestamp_millis().saturating_sub(birth.timestamp_millis());
  (lived_ms as f64 / MS_PER_YEAR).max(0.0)
}

/// Whole years, birthday-aware. A birth date in the future gives 0.
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> u32 {
  let mut age = today.year() - birth.year();
  if (today.month(), today.day()) < (birth.month(), birth.day()) {
    age -= 1;
  }
  age.max(0) as u32
}

pub fn calculate_life_progress<B: TimeZone, N: TimeZone>(
  birth: &DateTime<B>,
  estimated_lifespan: f64,
  range_min: f64,
  range_max: f64,
  now: &DateTime<N>,
) -> LifeProgress {
  let years_lived = precise_age(birth, now);
  let years_remaining = (estimated_lifespan - years_lived).max(0.0);
  let percent = clamp(years_lived / estimated_lifespan * 100.0, 0.0, 100.0);

  let total_ms = (estimated_lifespan.max(0.0) * MS_PER_YEAR).round() as i64;
  let remaining_ms = ((years_remaining * MS_PER_YEAR).round() as i64).min(total_ms);

  let status = if percent >= 100.0 {
    ProgressStatus::Ended
  } else {
    ProgressStatus::InProgress
  };

  LifeProgress {
    progress: Progress {
      percent,
      elapsed_ms: total_ms - remaining_ms,
      remaining_ms,
      total_ms,
      status,
    },
    estimated_lifespan,
    range_min,
    range_max,
    years_lived,
    years_remaining,
    months_remaining: (years_remaining * 12.0).floor() as i64,
    days_remaining: (years_remaining * DAYS_PER_YEAR).floor() as i64,
  }
}

/// Life progress from a stored estimate
pub fn estimate_progress<N: TimeZone>(
  birth: &DateTime<Utc>,
  estimate: &LifeExpectancyEstimate,
  now: &DateTime<N>,
) -> LifeProgress {
  calculate_life_progress(
    birth,
    estimate.adjusted_years,
    estimate.range_min,
    estimate.range_max,
    now,
  )
}

/// Birth dates are calendar dates; they count from UTC midnight
pub fn birth_instant(birth_date: NaiveDate) -> DateTime<Utc> {
  birth_date.and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn life_timer_progress<N: TimeZone>(timer: &LifeTimer, now: &DateTime<N>) -> LifeProgress {
  estimate_progress(&birth_instant(timer.data.birth_date), &timer.result, now)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
