//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock timer and profile factories
//! - Helper assertions

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::db::AppState;
use crate::config::AppConfig;
use crate::life_expectancy::{
  ActivityLevel, LifeExpectancyEstimate, LifestyleProfile, ParentLongevity, Sex, SmokingStatus,
};
use crate::models::{LifeTimer, LifeTimerData, Timer};
use crate::period::PeriodKind;
use crate::progress::DisplayMode;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) so every query sees the same in-memory database
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over a fresh in-memory database with offline lookups
pub async fn setup_test_state() -> AppState {
  AppState {
    db: setup_test_db().await,
    config: AppConfig::default(),
  }
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Calendar timer shown as elapsed
pub fn mock_period_timer(kind: PeriodKind) -> Timer {
  Timer::new_period(kind, Utc::now())
}

/// Custom-range timer shown as elapsed
pub fn mock_custom_timer(name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Timer {
  Timer::new_custom(name, start, end, DisplayMode::Elapsed, Utc::now())
}

/// German male, never smoked, moderately active, nothing else reported
pub fn mock_profile() -> LifestyleProfile {
  LifestyleProfile {
    country: "DE".to_string(),
    sex: Sex::Male,
    smoking_status: SmokingStatus::Never,
    activity_level: ActivityLevel::Moderate,
    parent_reached_85: ParentLongevity::Unknown,
    chronic_conditions: Default::default(),
  }
}

/// Life timer whose stored estimate is `adjusted_years` with a +/-4 band
pub fn mock_life_timer(name: &str, birth_date: NaiveDate, adjusted_years: f64) -> LifeTimer {
  let fetched_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
  LifeTimer {
    id: uuid::Uuid::new_v4().to_string(),
    name: name.to_string(),
    data: LifeTimerData {
      birth_date,
      profile: mock_profile(),
    },
    result: LifeExpectancyEstimate {
      baseline_years: adjusted_years,
      adjusted_years,
      range_min: adjusted_years - 4.0,
      range_max: adjusted_years + 4.0,
      source: "test".to_string(),
      fetched_at,
    },
    created_at: fetched_at,
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('timers', 'settings', 'life_timers', 'baseline_cache')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let timer = mock_period_timer(PeriodKind::Week);
    assert_eq!(timer.name, "Week");
    assert!(timer.custom_interval().bounds().is_none());

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let custom = mock_custom_timer("Trip", start, start + chrono::Duration::days(1));
    assert!(custom.custom_interval().bounds().is_some());

    let life = mock_life_timer("Me", NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(), 80.0);
    assert_eq!(life.result.range_min, 76.0);
    assert_eq!(life.data.profile.country, "DE");
  }
}
