use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notifications::NotificationConfig;
use crate::period::{CustomInterval, PeriodKind};
use crate::progress::DisplayMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
  Standard,
  Custom,
  Life,
}

impl TimerKind {
  pub fn for_period(kind: PeriodKind) -> Self {
    match kind {
      PeriodKind::Custom => Self::Custom,
      _ => Self::Standard,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Standard => "standard",
      Self::Custom => "custom",
      Self::Life => "life",
    }
  }
}

impl std::str::FromStr for TimerKind {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "standard" => Ok(Self::Standard),
      "custom" => Ok(Self::Custom),
      "life" => Ok(Self::Life),
      _ => Err(format!("Unknown timer kind: {}", s)),
    }
  }
}

/// A calendar or custom-range timer as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
  pub id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub timer_type: PeriodKind,
  /// Orientation chosen at creation
  pub mode: DisplayMode,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<TimerKind>,
  /// Current toggle state; overrides `mode` when set
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub view_mode: Option<DisplayMode>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notifications: Option<NotificationConfig>,
}

impl Timer {
  pub fn new_period(kind: PeriodKind, now: DateTime<Utc>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name: kind.label().to_string(),
      timer_type: kind,
      mode: DisplayMode::Elapsed,
      start_date: None,
      end_date: None,
      created_at: now,
      kind: Some(TimerKind::for_period(kind)),
      view_mode: Some(DisplayMode::Elapsed),
      notifications: None,
    }
  }

  pub fn new_custom(
    name: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    mode: DisplayMode,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name: name.trim().to_string(),
      timer_type: PeriodKind::Custom,
      mode,
      start_date: Some(start),
      end_date: Some(end),
      created_at: now,
      kind: Some(TimerKind::Custom),
      view_mode: Some(mode),
      notifications: Some(NotificationConfig::default()),
    }
  }

  pub fn effective_mode(&self) -> DisplayMode {
    self.view_mode.unwrap_or(self.mode)
  }

  pub fn custom_interval(&self) -> CustomInterval {
    CustomInterval {
      start: self.start_date,
      end: self.end_date,
    }
  }

  pub fn is_custom(&self) -> bool {
    self.timer_type == PeriodKind::Custom
  }

  /// Flip the displayed orientation
  pub fn toggle_view_mode(&mut self) -> DisplayMode {
    let next = self.effective_mode().toggled();
    self.view_mode = Some(next);
    next
  }
}

/// Day, Week, Month and Year, each shown as elapsed
pub fn default_timers(now: DateTime<Utc>) -> Vec<Timer> {
  PeriodKind::CALENDAR
    .iter()
    .map(|kind| Timer::new_period(*kind, now))
    .collect()
}
