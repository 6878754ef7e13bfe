//! Versioned upgrade of persisted app state
//!
//! Older app builds wrote timer and life-timer state as loosely-typed JSON
//! without a version field (v0). Upgrades are forward-only and run on the raw
//! JSON before it is read into typed records, so the calculation modules
//! never see legacy shapes.
//!
//! Versions:
//! - v0: no `version` field, single life profile, single `chronicCondition`
//! - v1: `kind`/`viewMode` on every timer, `lifeTimers` array

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::life_expectancy::{ChronicCondition, LifeExpectancyEstimate};
use crate::models::{LifeTimer, LifeTimerData, Timer};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTimerState {
  pub version: u32,
  pub timers: Vec<Timer>,
  pub initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLifeTimerState {
  pub version: u32,
  pub life_timers: Vec<LifeTimer>,
  /// Legacy single-profile fields, kept for reference after upgrade
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub life_timer_data: Option<LifeTimerData>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub life_expectancy_result: Option<LifeExpectancyEstimate>,
}

/// Missing or non-object state counts as v0
pub fn detect_version(raw: &Value) -> u32 {
  raw
    .as_object()
    .and_then(|obj| obj.get("version"))
    .and_then(Value::as_u64)
    .map(|v| v as u32)
    .unwrap_or(0)
}

pub fn needs_migration(raw: &Value) -> bool {
  detect_version(raw) < SCHEMA_VERSION
}

/// ---------------------------------------------------------------------------
/// Timer State
/// ---------------------------------------------------------------------------

fn timer_v0_to_v1(raw: Value) -> Value {
  let obj = raw.as_object().cloned().unwrap_or_default();

  let timers: Vec<Value> = obj
    .get("timers")
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or_default()
    .into_iter()
    .map(|timer| {
      let Value::Object(mut timer) = timer else {
        return timer;
      };
      if timer.get("kind").map_or(true, Value::is_null) {
        let kind = if timer.get("type").and_then(Value::as_str) == Some("custom") {
          "custom"
        } else {
          "standard"
        };
        timer.insert("kind".to_string(), Value::from(kind));
      }
      if timer.get("viewMode").map_or(true, Value::is_null) {
        let mode = timer.get("mode").cloned().unwrap_or(Value::Null);
        timer.insert("viewMode".to_string(), mode);
      }
      Value::Object(timer)
    })
    .collect();

  let mut upgraded = Map::new();
  upgraded.insert("version".to_string(), Value::from(1));
  upgraded.insert("timers".to_string(), Value::Array(timers));
  upgraded.insert(
    "initialized".to_string(),
    Value::from(obj.get("initialized").and_then(Value::as_bool).unwrap_or(false)),
  );
  Value::Object(upgraded)
}

/// Bring stored timer state up to [`SCHEMA_VERSION`]. Records that still do
/// not parse are dropped with a warning instead of failing the whole load.
pub fn migrate_timer_data(raw: Value) -> PersistedTimerState {
  let mut version = detect_version(&raw);
  let mut current = raw;

  while version < SCHEMA_VERSION {
    log::info!("Migrating timer state from v{} to v{}", version, version + 1);
    current = match version {
      0 => timer_v0_to_v1(current),
      _ => break,
    };
    version += 1;
  }

  PersistedTimerState {
    version,
    timers: parse_records(current.get("timers"), "timer"),
    initialized: current.get("initialized").and_then(Value::as_bool).unwrap_or(false),
  }
}

/// ---------------------------------------------------------------------------
/// Life Timer State
/// ---------------------------------------------------------------------------

/// Rewrite a legacy profile object in place: a single `chronicCondition`
/// becomes the `chronicConditions` array; "none" and unknown entries drop out.
pub fn upgrade_legacy_profile(raw: Value) -> Value {
  let Value::Object(mut obj) = raw else {
    return raw;
  };

  let entries: Vec<Value> = match (obj.remove("chronicConditions"), obj.remove("chronicCondition")) {
    (Some(Value::Array(list)), _) => list,
    (_, Some(single)) => vec![single],
    _ => Vec::new(),
  };

  let conditions: Vec<Value> = entries
    .iter()
    .filter_map(Value::as_str)
    .filter_map(|s| s.parse::<ChronicCondition>().ok())
    .map(|c| Value::from(c.as_str()))
    .collect();

  obj.insert("chronicConditions".to_string(), Value::Array(conditions));
  Value::Object(obj)
}

fn upgrade_life_timer_record(raw: Value) -> Value {
  let Value::Object(mut obj) = raw else {
    return raw;
  };
  if let Some(data) = obj.remove("data") {
    obj.insert("data".to_string(), upgrade_legacy_profile(data));
  }
  Value::Object(obj)
}

fn life_v0_to_v1(raw: Value) -> Value {
  let obj = raw.as_object().cloned().unwrap_or_default();
  let mut upgraded = Map::new();
  upgraded.insert("version".to_string(), Value::from(1));

  let existing = obj
    .get("lifeTimers")
    .and_then(Value::as_array)
    .filter(|list| !list.is_empty());

  match existing {
    Some(list) => {
      upgraded.insert("lifeTimers".to_string(), Value::Array(list.clone()));
    }
    None => {
      upgraded.insert("lifeTimers".to_string(), Value::Array(Vec::new()));
      upgraded.insert(
        "lifeTimerData".to_string(),
        obj.get("lifeTimerData").cloned().unwrap_or(Value::Null),
      );
      upgraded.insert(
        "lifeExpectancyResult".to_string(),
        obj.get("lifeExpectancyResult").cloned().unwrap_or(Value::Null),
      );
    }
  }

  Value::Object(upgraded)
}

pub fn migrate_life_timer_data(raw: Value) -> PersistedLifeTimerState {
  let mut version = detect_version(&raw);
  let mut current = raw;

  while version < SCHEMA_VERSION {
    log::info!("Migrating life timer state from v{} to v{}", version, version + 1);
    current = match version {
      0 => life_v0_to_v1(current),
      _ => break,
    };
    version += 1;
  }

  let life_timers = current
    .get("lifeTimers")
    .and_then(Value::as_array)
    .map(|list| {
      list
        .iter()
        .cloned()
        .map(upgrade_life_timer_record)
        .collect::<Vec<_>>()
    })
    .map(Value::Array);

  PersistedLifeTimerState {
    version,
    life_timers: parse_records(life_timers.as_ref(), "life timer"),
    life_timer_data: current
      .get("lifeTimerData")
      .filter(|v| !v.is_null())
      .cloned()
      .map(upgrade_legacy_profile)
      .and_then(|v| parse_one(v, "legacy life timer data")),
    life_expectancy_result: current
      .get("lifeExpectancyResult")
      .filter(|v| !v.is_null())
      .cloned()
      .and_then(|v| parse_one(v, "legacy life expectancy result")),
  }
}

/// ---------------------------------------------------------------------------
/// Helpers
/// ---------------------------------------------------------------------------

fn parse_one<T: serde::de::DeserializeOwned>(raw: Value, what: &str) -> Option<T> {
  match serde_json::from_value(raw) {
    Ok(value) => Some(value),
    Err(e) => {
      log::warn!("Dropping unreadable {}: {}", what, e);
      None
    }
  }
}

fn parse_records<T: serde::de::DeserializeOwned>(raw: Option<&Value>, what: &str) -> Vec<T> {
  raw
    .and_then(Value::as_array)
    .map(|list| {
      list
        .iter()
        .cloned()
        .filter_map(|record| parse_one(record, what))
        .collect()
    })
    .unwrap_or_default()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
