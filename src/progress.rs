//! Progress normalization
//!
//! Turns a reference instant and an interval into elapsed/remaining
//! durations, a clamped percentage and a lifecycle status. Every input,
//! including inverted or zero-length intervals, maps to a defined record.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Progress Status
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
  NotStarted,
  InProgress,
  Ended,
}

impl std::fmt::Display for ProgressStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NotStarted => write!(f, "not-started"),
      Self::InProgress => write!(f, "in-progress"),
      Self::Ended => write!(f, "ended"),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Display Mode
/// ---------------------------------------------------------------------------

/// Which way round a progress ring is drawn. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
  #[default]
  Elapsed,
  Remaining,
}

impl DisplayMode {
  pub fn toggled(self) -> Self {
    match self {
      Self::Elapsed => Self::Remaining,
      Self::Remaining => Self::Elapsed,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Elapsed => "elapsed",
      Self::Remaining => "remaining",
    }
  }
}

impl std::str::FromStr for DisplayMode {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "elapsed" => Ok(Self::Elapsed),
      "remaining" => Ok(Self::Remaining),
      _ => Err(format!("Unknown display mode: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Progress Record
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
  /// 0-100
  pub percent: f64,
  pub elapsed_ms: i64,
  pub remaining_ms: i64,
  pub total_ms: i64,
  pub status: ProgressStatus,
}

impl Progress {
  /// Record for an interval with no usable bounds (custom timer without dates)
  pub fn unset() -> Self {
    Self {
      percent: 0.0,
      elapsed_ms: 0,
      remaining_ms: 0,
      total_ms: 0,
      status: ProgressStatus::NotStarted,
    }
  }

  /// Record for an inverted or zero-length interval
  pub fn degenerate() -> Self {
    Self {
      percent: 100.0,
      elapsed_ms: 0,
      remaining_ms: 0,
      total_ms: 0,
      status: ProgressStatus::Ended,
    }
  }

  /// Copy with the percent inverted for the Remaining orientation.
  /// Raw durations are left alone; only the ring value flips.
  pub fn for_display(&self, mode: DisplayMode) -> Self {
    match mode {
      DisplayMode::Elapsed => *self,
      DisplayMode::Remaining => Self {
        percent: 100.0 - self.percent,
        ..*self
      },
    }
  }

  /// Duration shown next to the ring for the given orientation
  pub fn display_ms(&self, mode: DisplayMode) -> i64 {
    match mode {
      DisplayMode::Elapsed => self.elapsed_ms,
      DisplayMode::Remaining => self.remaining_ms,
    }
  }

  pub fn is_active(&self) -> bool {
    self.status == ProgressStatus::InProgress
  }
}

/// ---------------------------------------------------------------------------
/// Normalization
/// ---------------------------------------------------------------------------

/// Bound `value` to `[min, max]`; NaN resolves to `min`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
  if value.is_nan() {
    return min;
  }
  value.max(min).min(max)
}

/// Progress of `now` through `[start, end]`, compared on epoch milliseconds.
pub fn calculate_progress<N, I>(now: &DateTime<N>, start: &DateTime<I>, end: &DateTime<I>) -> Progress
where
  N: TimeZone,
  I: TimeZone,
{
  progress_from_millis(
    now.timestamp_millis(),
    start.timestamp_millis(),
    end.timestamp_millis(),
  )
}

/// Same as [`calculate_progress`] on raw epoch milliseconds.
pub fn progress_from_millis(now_ms: i64, start_ms: i64, end_ms: i64) -> Progress {
  let total_ms = end_ms.saturating_sub(start_ms);

  if total_ms <= 0 {
    return Progress::degenerate();
  }

  if now_ms < start_ms {
    return Progress {
      percent: 0.0,
      elapsed_ms: 0,
      remaining_ms: total_ms,
      total_ms,
      status: ProgressStatus::NotStarted,
    };
  }

  if now_ms > end_ms {
    return Progress {
      percent: 100.0,
      elapsed_ms: total_ms,
      remaining_ms: 0,
      total_ms,
      status: ProgressStatus::Ended,
    };
  }

  let elapsed_ms = now_ms - start_ms;
  let remaining_ms = end_ms - now_ms;
  let percent = clamp(elapsed_ms as f64 / total_ms as f64 * 100.0, 0.0, 100.0);

  Progress {
    percent,
    elapsed_ms,
    remaining_ms,
    total_ms,
    status: ProgressStatus::InProgress,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use proptest::prelude::*;

  fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
  }

  #[test]
  fn test_clamp_handles_nan_and_bounds() {
    assert_eq!(clamp(f64::NAN, 0.0, 100.0), 0.0);
    assert_eq!(clamp(-5.0, 0.0, 100.0), 0.0);
    assert_eq!(clamp(150.0, 0.0, 100.0), 100.0);
    assert_eq!(clamp(42.5, 0.0, 100.0), 42.5);
    assert_eq!(clamp(f64::INFINITY, 0.0, 100.0), 100.0);
  }

  #[test]
  fn test_midpoint_is_fifty_percent() {
    let progress = calculate_progress(&utc(2024, 1, 6), &utc(2024, 1, 1), &utc(2024, 1, 11));
    assert_eq!(progress.percent, 50.0);
    assert_eq!(progress.status, ProgressStatus::InProgress);
    assert_eq!(progress.elapsed_ms, 5 * 86_400_000);
    assert_eq!(progress.remaining_ms, 5 * 86_400_000);
  }

  #[test]
  fn test_not_started() {
    let progress = calculate_progress(&utc(2023, 12, 31), &utc(2024, 1, 1), &utc(2024, 1, 11));
    assert_eq!(progress.percent, 0.0);
    assert_eq!(progress.elapsed_ms, 0);
    assert_eq!(progress.remaining_ms, progress.total_ms);
    assert_eq!(progress.status, ProgressStatus::NotStarted);
  }

  #[test]
  fn test_ended() {
    let progress = calculate_progress(&utc(2024, 2, 1), &utc(2024, 1, 1), &utc(2024, 1, 11));
    assert_eq!(progress.percent, 100.0);
    assert_eq!(progress.elapsed_ms, progress.total_ms);
    assert_eq!(progress.remaining_ms, 0);
    assert_eq!(progress.status, ProgressStatus::Ended);
  }

  #[test]
  fn test_boundaries_are_inclusive() {
    let start = utc(2024, 1, 1);
    let end = utc(2024, 1, 11);

    let at_start = calculate_progress(&start, &start, &end);
    assert_eq!(at_start.status, ProgressStatus::InProgress);
    assert_eq!(at_start.percent, 0.0);

    let at_end = calculate_progress(&end, &start, &end);
    assert_eq!(at_end.status, ProgressStatus::InProgress);
    assert_eq!(at_end.percent, 100.0);
  }

  #[test]
  fn test_inverted_and_zero_length_intervals_are_ended() {
    let inverted = calculate_progress(&utc(2024, 1, 5), &utc(2024, 1, 11), &utc(2024, 1, 1));
    assert_eq!(inverted, Progress::degenerate());

    let zero = calculate_progress(&utc(2024, 1, 5), &utc(2024, 1, 1), &utc(2024, 1, 1));
    assert_eq!(zero.percent, 100.0);
    assert_eq!(zero.total_ms, 0);
    assert_eq!(zero.status, ProgressStatus::Ended);
  }

  #[test]
  fn test_remaining_display_inverts_percent_only() {
    let progress = progress_from_millis(250, 0, 1000);
    let shown = progress.for_display(DisplayMode::Remaining);

    assert_eq!(shown.percent, 75.0);
    assert_eq!(shown.elapsed_ms, 250);
    assert_eq!(shown.remaining_ms, 750);
    assert_eq!(progress.percent, 25.0, "original record untouched");
    assert_eq!(progress.for_display(DisplayMode::Elapsed), progress);
  }

  #[test]
  fn test_status_serializes_kebab_case() {
    let json = serde_json::to_string(&progress_from_millis(-1, 0, 10)).unwrap();
    assert!(json.contains("\"status\":\"not-started\""));
    assert!(json.contains("\"elapsedMs\":0"));
  }

  #[test]
  fn test_display_mode_toggle_and_parse() {
    assert_eq!(DisplayMode::Elapsed.toggled(), DisplayMode::Remaining);
    assert_eq!("remaining".parse::<DisplayMode>(), Ok(DisplayMode::Remaining));
    assert!("sideways".parse::<DisplayMode>().is_err());
  }

  proptest! {
    /// Durations always add up and the percent stays in range
    #[test]
    fn progress_invariants_hold(
      start in -1_000_000_000i64..1_000_000_000,
      len in 1i64..1_000_000_000,
      offset in -2_000_000_000i64..2_000_000_000,
    ) {
      let end = start + len;
      let progress = progress_from_millis(start + offset, start, end);

      prop_assert_eq!(progress.elapsed_ms + progress.remaining_ms, progress.total_ms);
      prop_assert!(progress.percent >= 0.0 && progress.percent <= 100.0);
      prop_assert!(progress.elapsed_ms >= 0 && progress.remaining_ms >= 0);
    }

    /// Any interval with end <= start is fully elapsed regardless of now
    #[test]
    fn degenerate_interval_always_ended(
      start in -1_000_000i64..1_000_000,
      back in 0i64..1_000_000,
      now in -5_000_000i64..5_000_000,
    ) {
      let progress = progress_from_millis(now, start, start - back);
      prop_assert_eq!(progress.percent, 100.0);
      prop_assert_eq!(progress.status, ProgressStatus::Ended);
    }
  }
}
