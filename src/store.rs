//! SQLite persistence for timers, settings, life timers and cached baselines

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::format::PercentDecimals;
use crate::models::{LifeTimer, Settings, Timer, TimerKind};
use crate::period::PeriodKind;
use crate::progress::DisplayMode;
use crate::world_bank::{BaselineCache, CacheEntry};

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| format!("Invalid timestamp {}: {}", raw, e))
}

fn parse_optional_instant(raw: Option<String>) -> Result<Option<DateTime<Utc>>, String> {
  raw.as_deref().map(parse_instant).transpose()
}

/// ---------------------------------------------------------------------------
/// Timers
/// ---------------------------------------------------------------------------

type TimerRow = (
  String,
  String,
  String,
  String,
  Option<String>,
  Option<String>,
  String,
  Option<String>,
  Option<String>,
  Option<String>,
);

fn timer_from_row(row: TimerRow) -> Result<Timer, String> {
  let (id, name, timer_type, mode, start_date, end_date, created_at, kind, view_mode, notifications_json) = row;

  Ok(Timer {
    id,
    name,
    timer_type: timer_type.parse::<PeriodKind>()?,
    mode: mode.parse::<DisplayMode>()?,
    start_date: parse_optional_instant(start_date)?,
    end_date: parse_optional_instant(end_date)?,
    created_at: parse_instant(&created_at)?,
    kind: kind.map(|k| k.parse::<TimerKind>()).transpose()?,
    view_mode: view_mode.map(|m| m.parse::<DisplayMode>()).transpose()?,
    notifications: notifications_json
      .map(|json| serde_json::from_str(&json))
      .transpose()
      .map_err(|e| format!("Invalid notification config: {}", e))?,
  })
}

/// Timers in insertion order; unreadable rows are skipped
pub async fn load_timers(pool: &SqlitePool) -> Result<Vec<Timer>, String> {
  let rows: Vec<TimerRow> = sqlx::query_as(
    r#"
    SELECT id, name, timer_type, mode, start_date, end_date, created_at,
           kind, view_mode, notifications_json
    FROM timers
    ORDER BY rowid
    "#,
  )
  .fetch_all(pool)
  .await
  .map_err(|e| format!("Failed to load timers: {}", e))?;

  Ok(
    rows
      .into_iter()
      .filter_map(|row| {
        let id = row.0.clone();
        timer_from_row(row)
          .map_err(|e| log::warn!("Skipping unreadable timer {}: {}", id, e))
          .ok()
      })
      .collect(),
  )
}

pub async fn load_timer(pool: &SqlitePool, id: &str) -> Result<Option<Timer>, String> {
  let row: Option<TimerRow> = sqlx::query_as(
    r#"
    SELECT id, name, timer_type, mode, start_date, end_date, created_at,
           kind, view_mode, notifications_json
    FROM timers
    WHERE id = ?1
    "#,
  )
  .bind(id)
  .fetch_optional(pool)
  .await
  .map_err(|e| format!("Failed to load timer: {}", e))?;

  row.map(timer_from_row).transpose()
}

/// Insert or replace by id
pub async fn save_timer(pool: &SqlitePool, timer: &Timer) -> Result<(), String> {
  save_timer_with(pool, timer).await
}

async fn save_timer_with<'e, E>(executor: E, timer: &Timer) -> Result<(), String>
where
  E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
  let notifications_json = timer
    .notifications
    .as_ref()
    .map(serde_json::to_string)
    .transpose()
    .map_err(|e| format!("Failed to serialize notification config: {}", e))?;

  sqlx::query(
    r#"
    INSERT INTO timers (
      id, name, timer_type, mode, start_date, end_date, created_at,
      kind, view_mode, notifications_json
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(id) DO UPDATE SET
      name = excluded.name,
      timer_type = excluded.timer_type,
      mode = excluded.mode,
      start_date = excluded.start_date,
      end_date = excluded.end_date,
      kind = excluded.kind,
      view_mode = excluded.view_mode,
      notifications_json = excluded.notifications_json
    "#,
  )
  .bind(&timer.id)
  .bind(&timer.name)
  .bind(timer.timer_type.as_str())
  .bind(timer.mode.as_str())
  .bind(timer.start_date.map(|d| d.to_rfc3339()))
  .bind(timer.end_date.map(|d| d.to_rfc3339()))
  .bind(timer.created_at.to_rfc3339())
  .bind(timer.kind.map(|k| k.as_str()))
  .bind(timer.view_mode.map(|m| m.as_str()))
  .bind(notifications_json)
  .execute(executor)
  .await
  .map_err(|e| format!("Failed to save timer: {}", e))?;

  Ok(())
}

/// Returns whether a row was removed
pub async fn delete_timer(pool: &SqlitePool, id: &str) -> Result<bool, String> {
  let result = sqlx::query("DELETE FROM timers WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| format!("Failed to delete timer: {}", e))?;

  Ok(result.rows_affected() > 0)
}

/// Replace every stored timer with `timers` in one transaction
pub async fn replace_timers(pool: &SqlitePool, timers: &[Timer]) -> Result<(), String> {
  let mut tx = pool
    .begin()
    .await
    .map_err(|e| format!("Failed to begin transaction: {}", e))?;

  sqlx::query("DELETE FROM timers")
    .execute(&mut *tx)
    .await
    .map_err(|e| format!("Failed to clear timers: {}", e))?;

  for timer in timers {
    save_timer_with(&mut *tx, timer).await?;
  }

  tx.commit()
    .await
    .map_err(|e| format!("Failed to commit timers: {}", e))
}

/// ---------------------------------------------------------------------------
/// Settings
/// ---------------------------------------------------------------------------

pub async fn load_settings(pool: &SqlitePool) -> Result<Settings, String> {
  let row: Option<(String, String, i64)> =
    sqlx::query_as("SELECT theme, week_start, percent_decimals FROM settings WHERE id = 1")
      .fetch_optional(pool)
      .await
      .map_err(|e| format!("Failed to get settings: {}", e))?;

  match row {
    Some((theme, week_start, decimals)) => {
      let percent_decimals = u8::try_from(decimals)
        .map_err(|e| e.to_string())
        .and_then(PercentDecimals::try_from)
        .unwrap_or_else(|e| {
          log::warn!("Stored percent decimals rejected ({}), using default", e);
          PercentDecimals::default()
        });

      Ok(Settings {
        theme: theme.parse().unwrap_or_default(),
        week_start: week_start.parse().unwrap_or_default(),
        percent_decimals,
      })
    }
    None => Ok(Settings::default()),
  }
}

pub async fn save_settings(pool: &SqlitePool, settings: &Settings) -> Result<(), String> {
  sqlx::query(
    r#"
    INSERT INTO settings (id, theme, week_start, percent_decimals, updated_at)
    VALUES (1, ?1, ?2, ?3, CURRENT_TIMESTAMP)
    ON CONFLICT(id) DO UPDATE SET
      theme = excluded.theme,
      week_start = excluded.week_start,
      percent_decimals = excluded.percent_decimals,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(settings.theme.as_str())
  .bind(settings.week_start.to_string())
  .bind(settings.percent_decimals.get() as i64)
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to update settings: {}", e))?;

  Ok(())
}

/// Whether default timers have already been seeded
pub async fn is_initialized(pool: &SqlitePool) -> Result<bool, String> {
  let flag: Option<i64> = sqlx::query_scalar("SELECT initialized FROM settings WHERE id = 1")
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to read initialization flag: {}", e))?;

  Ok(flag.unwrap_or(0) != 0)
}

pub async fn mark_initialized(pool: &SqlitePool) -> Result<(), String> {
  sqlx::query(
    r#"
    INSERT INTO settings (id, initialized) VALUES (1, 1)
    ON CONFLICT(id) DO UPDATE SET initialized = 1
    "#,
  )
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to mark initialized: {}", e))?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Life Timers
/// ---------------------------------------------------------------------------

fn life_timer_from_row(row: (String, String, String, String, String)) -> Result<LifeTimer, String> {
  let (id, name, data_json, result_json, created_at) = row;
  Ok(LifeTimer {
    id,
    name,
    data: serde_json::from_str(&data_json).map_err(|e| format!("Invalid life timer data: {}", e))?,
    result: serde_json::from_str(&result_json).map_err(|e| format!("Invalid life timer result: {}", e))?,
    created_at: parse_instant(&created_at)?,
  })
}

pub async fn load_life_timers(pool: &SqlitePool) -> Result<Vec<LifeTimer>, String> {
  let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
    "SELECT id, name, data_json, result_json, created_at FROM life_timers ORDER BY rowid",
  )
  .fetch_all(pool)
  .await
  .map_err(|e| format!("Failed to load life timers: {}", e))?;

  Ok(
    rows
      .into_iter()
      .filter_map(|row| {
        let id = row.0.clone();
        life_timer_from_row(row)
          .map_err(|e| log::warn!("Skipping unreadable life timer {}: {}", id, e))
          .ok()
      })
      .collect(),
  )
}

pub async fn save_life_timer(pool: &SqlitePool, timer: &LifeTimer) -> Result<(), String> {
  let data_json = serde_json::to_string(&timer.data).map_err(|e| format!("Failed to serialize life timer data: {}", e))?;
  let result_json =
    serde_json::to_string(&timer.result).map_err(|e| format!("Failed to serialize life timer result: {}", e))?;

  sqlx::query(
    r#"
    INSERT INTO life_timers (id, name, data_json, result_json, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(id) DO UPDATE SET
      name = excluded.name,
      data_json = excluded.data_json,
      result_json = excluded.result_json
    "#,
  )
  .bind(&timer.id)
  .bind(&timer.name)
  .bind(data_json)
  .bind(result_json)
  .bind(timer.created_at.to_rfc3339())
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to save life timer: {}", e))?;

  Ok(())
}

pub async fn delete_life_timer(pool: &SqlitePool, id: &str) -> Result<bool, String> {
  let result = sqlx::query("DELETE FROM life_timers WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| format!("Failed to delete life timer: {}", e))?;

  Ok(result.rows_affected() > 0)
}

/// ---------------------------------------------------------------------------
/// Baseline Cache
/// ---------------------------------------------------------------------------

pub async fn load_baseline_cache(pool: &SqlitePool, ttl_days: i64) -> Result<BaselineCache, String> {
  let rows: Vec<(String, f64, String)> = sqlx::query_as("SELECT cache_key, years, fetched_at FROM baseline_cache")
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to load baseline cache: {}", e))?;

  let mut cache = BaselineCache::new(ttl_days);
  for (key, years, fetched_at) in rows {
    match parse_instant(&fetched_at) {
      Ok(fetched_at) => cache.insert_entry(key, CacheEntry { years, fetched_at }),
      Err(e) => log::warn!("Ignoring cached baseline {}: {}", key, e),
    }
  }

  Ok(cache)
}

pub async fn store_baseline(pool: &SqlitePool, key: &str, entry: &CacheEntry) -> Result<(), String> {
  sqlx::query(
    r#"
    INSERT INTO baseline_cache (cache_key, years, fetched_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(cache_key) DO UPDATE SET
      years = excluded.years,
      fetched_at = excluded.fetched_at
    "#,
  )
  .bind(key)
  .bind(entry.years)
  .bind(entry.fetched_at.to_rfc3339())
  .execute(pool)
  .await
  .map_err(|e| format!("Failed to store baseline: {}", e))?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
