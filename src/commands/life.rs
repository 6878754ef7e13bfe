//! Life timer commands

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::life_expectancy::{estimate, estimate_from_baseline, CountryInfo, LifeExpectancyEstimate, OfflineTable};
use crate::life_progress::{calculate_age, life_timer_progress, LifeProgress};
use crate::models::{LifeTimer, LifeTimerData};
use crate::store;
use crate::world_bank::{refresh_baseline, BaselineCache, BaselineOrigin, CacheEntry, WorldBankClient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeTimerWithProgress {
  pub timer: LifeTimer,
  pub progress: LifeProgress,
  /// Whole years, for display
  pub age: u32,
}

pub fn get_countries() -> Vec<CountryInfo> {
  OfflineTable::bundled().countries()
}

/// Estimate for a profile using the configured source. Online lookups go
/// through the persisted cache and never fail; the bundled table covers gaps.
pub async fn estimate_for(
  state: &AppState,
  data: &LifeTimerData,
  now: DateTime<Utc>,
) -> Result<LifeExpectancyEstimate, String> {
  let params = &state.config.estimator;
  let table = OfflineTable::bundled();

  if !state.config.online_lookup {
    return Ok(estimate(&data.profile, table, params, now));
  }

  let mut cache: BaselineCache = store::load_baseline_cache(&state.db, state.config.cache_ttl_days).await?;
  let client = WorldBankClient::new(&state.config.world_bank_url);
  let (baseline, origin) = refresh_baseline(&client, &mut cache, table, &data.profile.country, data.profile.sex, now).await;

  if origin == BaselineOrigin::Fetched {
    let key = BaselineCache::key(&data.profile.country, data.profile.sex);
    let entry = CacheEntry {
      years: baseline.years,
      fetched_at: now,
    };
    store::store_baseline(&state.db, &key, &entry).await?;
  }

  Ok(estimate_from_baseline(baseline, &data.profile, params, now))
}

pub async fn create_life_timer(state: &AppState, name: String, data: LifeTimerData) -> Result<LifeTimer, String> {
  let now = Utc::now();
  if data.birth_date > Local::now().date_naive() {
    return Err("Birth date must not be in the future".to_string());
  }

  let result = estimate_for(state, &data, now).await?;
  let timer = LifeTimer::new(&name, data, result, now);
  store::save_life_timer(&state.db, &timer).await?;

  log::info!(
    "Created life timer {} ({:.1} years, {})",
    timer.id,
    timer.result.adjusted_years,
    timer.result.source
  );
  Ok(timer)
}

pub async fn get_life_timers_with_progress(state: &AppState) -> Result<Vec<LifeTimerWithProgress>, String> {
  life_timers_with_progress_at(state, &Local::now()).await
}

/// Ages roll over at local midnight of `now`'s time zone
pub async fn life_timers_with_progress_at<Tz: TimeZone>(
  state: &AppState,
  now: &DateTime<Tz>,
) -> Result<Vec<LifeTimerWithProgress>, String> {
  let timers = store::load_life_timers(&state.db).await?;

  Ok(
    timers
      .into_iter()
      .map(|timer| LifeTimerWithProgress {
        progress: life_timer_progress(&timer, now),
        age: calculate_age(timer.data.birth_date, now.date_naive()),
        timer,
      })
      .collect(),
  )
}

pub async fn remove_life_timer(state: &AppState, timer_id: String) -> Result<(), String> {
  if !store::delete_life_timer(&state.db, &timer_id).await? {
    return Err(format!("Life timer not found: {}", timer_id));
  }
  Ok(())
}
