//! Timer commands

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::format::{display_time_text, format_percent};
use crate::models::{default_timers, Settings, Timer};
use crate::notifications::{plan_threshold_notifications, NotificationConfig, PlannedNotification};
use crate::period::timer_progress;
use crate::progress::{DisplayMode, Progress};
use crate::store;
use crate::widget::{select_widget_timer, widget_snapshot, WidgetData};

/// A timer with its display-oriented progress and pre-formatted labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerWithProgress {
  pub timer: Timer,
  pub progress: Progress,
  pub percent_text: String,
  pub time_text: String,
}

pub fn with_progress<Tz: TimeZone>(timer: Timer, settings: &Settings, now: &DateTime<Tz>) -> TimerWithProgress {
  let mode = timer.effective_mode();
  let progress = timer_progress(&timer, settings.week_start, now);

  TimerWithProgress {
    percent_text: format_percent(progress.percent, settings.percent_decimals),
    time_text: display_time_text(&progress, mode),
    timer,
    progress,
  }
}

pub async fn get_timers_with_progress(state: &AppState) -> Result<Vec<TimerWithProgress>, String> {
  timers_with_progress_at(state, &Local::now()).await
}

pub async fn timers_with_progress_at<Tz: TimeZone>(
  state: &AppState,
  now: &DateTime<Tz>,
) -> Result<Vec<TimerWithProgress>, String> {
  let settings = store::load_settings(&state.db).await?;
  let timers = store::load_timers(&state.db).await?;

  Ok(
    timers
      .into_iter()
      .map(|timer| with_progress(timer, &settings, now))
      .collect(),
  )
}

fn validate_name(name: &str) -> Result<(), String> {
  if name.trim().is_empty() {
    return Err("Timer name must not be empty".to_string());
  }
  Ok(())
}

fn validate_range(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<(), String> {
  if end_date <= start_date {
    return Err("End date must be after start date".to_string());
  }
  Ok(())
}

/// Create a custom-range timer; the name must be non-empty and end after start
pub async fn add_custom_timer(
  state: &AppState,
  name: String,
  start_date: DateTime<Utc>,
  end_date: DateTime<Utc>,
  mode: Option<DisplayMode>,
  notifications: Option<NotificationConfig>,
) -> Result<Timer, String> {
  validate_name(&name)?;
  validate_range(start_date, end_date)?;

  let mut timer = Timer::new_custom(&name, start_date, end_date, mode.unwrap_or_default(), Utc::now());
  if let Some(config) = notifications {
    timer.notifications = Some(config);
  }
  store::save_timer(&state.db, &timer).await?;

  log::info!("Added custom timer {} ({})", timer.name, timer.id);
  Ok(timer)
}

/// Fields to change on an existing timer; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdate {
  pub name: Option<String>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date: Option<DateTime<Utc>>,
  pub mode: Option<DisplayMode>,
  pub notifications: Option<NotificationConfig>,
}

/// Edit a timer. Dates and notifications only apply to custom timers, and
/// the merged range must still end after it starts.
pub async fn update_timer(state: &AppState, timer_id: String, update: TimerUpdate) -> Result<Timer, String> {
  let mut timer = store::load_timer(&state.db, &timer_id)
    .await?
    .ok_or_else(|| format!("Timer not found: {}", timer_id))?;

  let touches_custom_fields = update.start_date.is_some() || update.end_date.is_some() || update.notifications.is_some();
  if touches_custom_fields && !timer.is_custom() {
    return Err(format!("{} timers have fixed dates and no notifications", timer.timer_type.label()));
  }

  if let Some(name) = update.name {
    validate_name(&name)?;
    timer.name = name.trim().to_string();
  }
  if let Some(start) = update.start_date {
    timer.start_date = Some(start);
  }
  if let Some(end) = update.end_date {
    timer.end_date = Some(end);
  }
  if let Some((start, end)) = timer.custom_interval().bounds() {
    validate_range(start, end)?;
  }
  if let Some(mode) = update.mode {
    timer.mode = mode;
    timer.view_mode = Some(mode);
  }
  if let Some(config) = update.notifications {
    timer.notifications = Some(config);
  }

  store::save_timer(&state.db, &timer).await?;
  log::info!("Updated timer {} ({})", timer.name, timer.id);
  Ok(timer)
}

/// Drop every timer and put the four calendar timers back
pub async fn reset_timers_to_defaults(state: &AppState) -> Result<Vec<Timer>, String> {
  let timers = default_timers(Utc::now());
  store::replace_timers(&state.db, &timers).await?;
  store::mark_initialized(&state.db).await?;

  log::info!("Reset timers to {} defaults", timers.len());
  Ok(timers)
}

/// Threshold notifications the host should schedule for a timer
pub async fn get_planned_notifications(state: &AppState, timer_id: String) -> Result<Vec<PlannedNotification>, String> {
  planned_notifications_at(state, &timer_id, Utc::now()).await
}

pub async fn planned_notifications_at(
  state: &AppState,
  timer_id: &str,
  now: DateTime<Utc>,
) -> Result<Vec<PlannedNotification>, String> {
  let timer = store::load_timer(&state.db, timer_id)
    .await?
    .ok_or_else(|| format!("Timer not found: {}", timer_id))?;

  Ok(plan_threshold_notifications(&timer, now))
}

/// Flip elapsed/remaining and persist it
pub async fn toggle_timer_view_mode(state: &AppState, timer_id: String) -> Result<Timer, String> {
  let mut timer = store::load_timer(&state.db, &timer_id)
    .await?
    .ok_or_else(|| format!("Timer not found: {}", timer_id))?;

  timer.toggle_view_mode();
  store::save_timer(&state.db, &timer).await?;
  Ok(timer)
}

pub async fn remove_timer(state: &AppState, timer_id: String) -> Result<(), String> {
  if !store::delete_timer(&state.db, &timer_id).await? {
    return Err(format!("Timer not found: {}", timer_id));
  }
  Ok(())
}

/// Snapshot for the configured widget timer, falling back to the first timer
pub async fn get_widget_snapshot(state: &AppState, timer_id: Option<String>) -> Result<Option<WidgetData>, String> {
  widget_snapshot_at(state, timer_id.as_deref(), &Local::now()).await
}

pub async fn widget_snapshot_at<Tz: TimeZone>(
  state: &AppState,
  timer_id: Option<&str>,
  now: &DateTime<Tz>,
) -> Result<Option<WidgetData>, String> {
  let settings = store::load_settings(&state.db).await?;
  let timers = store::load_timers(&state.db).await?;

  Ok(
    select_widget_timer(&timers, timer_id)
      .and_then(|timer| widget_snapshot(timer, settings.week_start, now)),
  )
}
