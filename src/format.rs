//! Display formatting for progress records
//!
//! Month and year lengths here are averages (30.44 / 365.25 days). They are
//! for labels only and never feed back into progress math.

use serde::{Deserialize, Serialize};

use crate::progress::{DisplayMode, Progress};

const AVG_DAYS_PER_MONTH: f64 = 30.44;
const AVG_DAYS_PER_YEAR: f64 = 365.25;

/// ---------------------------------------------------------------------------
/// Percent Precision
/// ---------------------------------------------------------------------------

/// Number of decimals shown for percentages (1, 2 or 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PercentDecimals(u8);

impl PercentDecimals {
  pub fn get(&self) -> usize {
    self.0 as usize
  }
}

impl Default for PercentDecimals {
  fn default() -> Self {
    Self(1)
  }
}

impl TryFrom<u8> for PercentDecimals {
  type Error = String;
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      1..=3 => Ok(Self(value)),
      _ => Err(format!("Percent decimals must be 1, 2 or 3 (got {})", value)),
    }
  }
}

impl From<PercentDecimals> for u8 {
  fn from(value: PercentDecimals) -> Self {
    value.0
  }
}

/// ---------------------------------------------------------------------------
/// Formatters
/// ---------------------------------------------------------------------------

/// Compact two-unit duration: "5s", "2m 5s", "1h 2m", "1d 1h", "2mo 5d", "1y 3mo".
/// Negative input is treated as zero.
pub fn format_duration(ms: i64) -> String {
  let ms = ms.max(0);

  let seconds = ms / 1000;
  let minutes = seconds / 60;
  let hours = minutes / 60;
  let days = hours / 24;
  let days_f = days as f64;
  let months = (days_f / AVG_DAYS_PER_MONTH).floor() as i64;
  let years = (days_f / AVG_DAYS_PER_YEAR).floor() as i64;

  if years > 0 {
    let remaining_months = ((days_f % AVG_DAYS_PER_YEAR) / AVG_DAYS_PER_MONTH).floor() as i64;
    if remaining_months > 0 {
      return format!("{}y {}mo", years, remaining_months);
    }
    return format!("{}y", years);
  }

  if months > 0 {
    let remaining_days = (days_f % AVG_DAYS_PER_MONTH).floor() as i64;
    if remaining_days > 0 {
      return format!("{}mo {}d", months, remaining_days);
    }
    return format!("{}mo", months);
  }

  if days > 0 {
    let remaining_hours = hours % 24;
    if remaining_hours > 0 {
      return format!("{}d {}h", days, remaining_hours);
    }
    return format!("{}d", days);
  }

  if hours > 0 {
    return format!("{}h {}m", hours, minutes % 60);
  }

  if minutes > 0 {
    return format!("{}m {}s", minutes, seconds % 60);
  }

  format!("{}s", seconds)
}

/// Ties round away from zero ("12.25" at one decimal is "12.3%"); `format!`
/// alone would round them to even.
pub fn format_percent(value: f64, decimals: PercentDecimals) -> String {
  let scale = 10f64.powi(decimals.get() as i32);
  let rounded = (value * scale).round() / scale;
  format!("{:.*}%", decimals.get(), rounded)
}

/// "3d 4h left" / "1h 2m elapsed"
pub fn display_time_text(progress: &Progress, mode: DisplayMode) -> String {
  let suffix = match mode {
    DisplayMode::Elapsed => "elapsed",
    DisplayMode::Remaining => "left",
  };
  format!("{} {}", format_duration(progress.display_ms(mode)), suffix)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
