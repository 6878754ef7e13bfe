//! Command handlers the host UI calls into
//!
//! Every handler takes the shared [`AppState`] and returns `Result<T, String>`
//! so errors can be shown as-is.

pub mod life;
pub mod share;
pub mod timers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::WeekStart;
use crate::config::AppConfig;
use crate::db::{initialize_db, AppState};
use crate::format::PercentDecimals;
use crate::migrations::{migrate_life_timer_data, migrate_timer_data};
use crate::models::{default_timers, Settings, Theme};
use crate::store;

/// Open the database and seed the default timers on first run
pub async fn bootstrap(config: AppConfig) -> Result<AppState, String> {
  let db = initialize_db(&config.db_path)
    .await
    .map_err(|e| format!("Failed to initialize database: {}", e))?;
  let state = AppState { db, config };

  seed_default_timers(&state, Utc::now()).await?;
  Ok(state)
}

/// Inserts the calendar timers once; returns how many were added
pub async fn seed_default_timers(state: &AppState, now: DateTime<Utc>) -> Result<usize, String> {
  if store::is_initialized(&state.db).await? {
    return Ok(0);
  }

  let timers = default_timers(now);
  for timer in &timers {
    store::save_timer(&state.db, timer).await?;
  }
  store::mark_initialized(&state.db).await?;

  log::info!("Seeded {} default timers", timers.len());
  Ok(timers.len())
}

pub async fn get_settings(state: &AppState) -> Result<Settings, String> {
  store::load_settings(&state.db).await
}

/// Patch settings; `None` keeps the stored value
pub async fn update_settings(
  state: &AppState,
  theme: Option<Theme>,
  week_start: Option<WeekStart>,
  percent_decimals: Option<u8>,
) -> Result<Settings, String> {
  let mut settings = store::load_settings(&state.db).await?;

  if let Some(theme) = theme {
    settings.theme = theme;
  }
  if let Some(week_start) = week_start {
    settings.week_start = week_start;
  }
  if let Some(decimals) = percent_decimals {
    settings.percent_decimals = PercentDecimals::try_from(decimals)?;
  }

  store::save_settings(&state.db, &settings).await?;
  Ok(settings)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyImportSummary {
  pub timers: usize,
  pub life_timers: usize,
}

/// Upgrade JSON state exported by older app builds and store what is readable
pub async fn import_legacy_state(
  state: &AppState,
  timers_json: Option<String>,
  life_timers_json: Option<String>,
) -> Result<LegacyImportSummary, String> {
  let mut summary = LegacyImportSummary {
    timers: 0,
    life_timers: 0,
  };

  if let Some(raw) = timers_json {
    let value = serde_json::from_str(&raw).map_err(|e| format!("Failed to parse timer state: {}", e))?;
    let upgraded = migrate_timer_data(value);
    for timer in &upgraded.timers {
      store::save_timer(&state.db, timer).await?;
    }
    if upgraded.initialized {
      store::mark_initialized(&state.db).await?;
    }
    summary.timers = upgraded.timers.len();
  }

  if let Some(raw) = life_timers_json {
    let value = serde_json::from_str(&raw).map_err(|e| format!("Failed to parse life timer state: {}", e))?;
    let upgraded = migrate_life_timer_data(value);
    for timer in &upgraded.life_timers {
      store::save_life_timer(&state.db, timer).await?;
    }
    summary.life_timers = upgraded.life_timers.len();
  }

  log::info!(
    "Imported {} timers and {} life timers from legacy state",
    summary.timers,
    summary.life_timers
  );
  Ok(summary)
}
