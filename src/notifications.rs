//! Threshold notification planning for custom timers
//!
//! Works out when each configured percentage is reached and what to say.
//! Delivery belongs to the host platform.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NotificationThreshold {
  Half,
  Most,
  Complete,
}

impl NotificationThreshold {
  pub const ALL: [NotificationThreshold; 3] = [Self::Half, Self::Most, Self::Complete];

  pub fn percent(&self) -> u8 {
    match self {
      Self::Half => 50,
      Self::Most => 80,
      Self::Complete => 100,
    }
  }

  /// (title, body) shown for this threshold
  pub fn message(&self, timer_name: &str) -> (String, String) {
    match self {
      Self::Half => (
        format!("{} - Halfway there!", timer_name),
        "50% of your timer has elapsed.".to_string(),
      ),
      Self::Most => (
        format!("{} - Almost done!", timer_name),
        "80% of your timer has elapsed. Only 20% remaining!".to_string(),
      ),
      Self::Complete => (
        format!("{} completed!", timer_name),
        "Your timer has reached its end date.".to_string(),
      ),
    }
  }
}

impl TryFrom<u8> for NotificationThreshold {
  type Error = String;
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      50 => Ok(Self::Half),
      80 => Ok(Self::Most),
      100 => Ok(Self::Complete),
      _ => Err(format!("Unsupported notification threshold: {}", value)),
    }
  }
}

impl From<NotificationThreshold> for u8 {
  fn from(value: NotificationThreshold) -> Self {
    value.percent()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
  pub enabled: bool,
  pub thresholds: Vec<NotificationThreshold>,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      thresholds: vec![NotificationThreshold::Complete],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedNotification {
  pub timer_id: String,
  pub threshold: NotificationThreshold,
  pub fire_at: DateTime<Utc>,
  /// Whole seconds from `now`, always positive
  pub delay_seconds: i64,
  pub title: String,
  pub body: String,
}

/// Upcoming threshold notifications for a custom timer. Thresholds already
/// passed (or less than a second away) are left out.
pub fn plan_threshold_notifications(timer: &Timer, now: DateTime<Utc>) -> Vec<PlannedNotification> {
  let Some((start, end)) = timer.custom_interval().bounds() else {
    return Vec::new();
  };
  let Some(config) = timer.notifications.as_ref().filter(|c| c.enabled) else {
    return Vec::new();
  };

  let start_ms = start.timestamp_millis();
  let total_ms = end.timestamp_millis() - start_ms;
  if total_ms <= 0 {
    return Vec::new();
  }

  let now_ms = now.timestamp_millis();
  let mut planned = Vec::new();

  for threshold in &config.thresholds {
    let offset_ms = (total_ms as f64 * threshold.percent() as f64 / 100.0) as i64;
    let fire_ms = start_ms + offset_ms;
    let delay_seconds = (fire_ms - now_ms).div_euclid(1000);

    if delay_seconds <= 0 {
      log::debug!("Skipping {}% notification for timer {}: already passed", threshold.percent(), timer.id);
      continue;
    }

    let (title, body) = threshold.message(&timer.name);
    planned.push(PlannedNotification {
      timer_id: timer.id.clone(),
      threshold: *threshold,
      fire_at: start + Duration::milliseconds(offset_ms),
      delay_seconds,
      title,
      body,
    });
  }

  planned
}

/// Thresholds crossed between two polled percentages, for hosts that poll
/// instead of scheduling ahead
pub fn newly_crossed(
  previous_percent: f64,
  current_percent: f64,
  thresholds: &[NotificationThreshold],
) -> Vec<NotificationThreshold> {
  let mut crossed: Vec<NotificationThreshold> = thresholds
    .iter()
    .copied()
    .filter(|t| {
      let p = t.percent() as f64;
      previous_percent < p && current_percent >= p
    })
    .collect();
  crossed.sort();
  crossed.dedup();
  crossed
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
