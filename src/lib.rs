pub mod calendar;
pub mod commands;
pub mod config;
pub mod db;
pub mod format;
pub mod life_expectancy;
pub mod life_progress;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod period;
pub mod progress;
pub mod share;
pub mod store;
pub mod widget;
pub mod world_bank;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use db::AppState;

/// Install the logger; honours `RUST_LOG`, defaults to `info`. Safe to call twice.
pub fn init_logging() {
  let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

/// Entry point for the app shells: load `.env`, open the database and seed
/// the default timers on first launch
pub async fn start() -> Result<AppState, String> {
  init_logging();

  let config = AppConfig::from_env().map_err(|e| e.to_string())?;
  log::info!(
    "Starting with database {} (online lookup: {})",
    config.db_path.display(),
    config.online_lookup
  );

  commands::bootstrap(config).await
}
