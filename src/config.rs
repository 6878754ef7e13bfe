//! Environment configuration

use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::life_expectancy::EstimatorParams;
use crate::world_bank::DEFAULT_WORLD_BANK_URL;

const DB_PATH_KEY: &str = "FLEETING_TIME_DB_PATH";
const WORLD_BANK_URL_KEY: &str = "FLEETING_TIME_WORLD_BANK_URL";
const ONLINE_LOOKUP_KEY: &str = "FLEETING_TIME_ONLINE_LOOKUP";
const CACHE_TTL_KEY: &str = "FLEETING_TIME_CACHE_TTL_DAYS";
const ADJUSTMENT_CAP_KEY: &str = "FLEETING_TIME_ADJUSTMENT_CAP";
const UNCERTAINTY_MARGIN_KEY: &str = "FLEETING_TIME_UNCERTAINTY_MARGIN";

const DEFAULT_DB_PATH: &str = "fleeting-time.db";
const DEFAULT_CACHE_TTL_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub db_path: PathBuf,
  pub world_bank_url: String,
  /// Use the World Bank API (with cache) instead of the bundled table only
  pub online_lookup: bool,
  pub cache_ttl_days: i64,
  pub estimator: EstimatorParams,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      db_path: PathBuf::from(DEFAULT_DB_PATH),
      world_bank_url: DEFAULT_WORLD_BANK_URL.to_string(),
      online_lookup: false,
      cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
      estimator: EstimatorParams::default(),
    }
  }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
  match env::var(key) {
    Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ConfigError::Invalid {
      key: key.to_string(),
      value: raw,
    }),
    _ => Ok(default),
  }
}

impl AppConfig {
  /// Read settings from the environment, loading `.env` first if present
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_vars()
  }

  /// Environment only, no `.env` file
  pub fn from_vars() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let cache_ttl_days: i64 = parse_var(CACHE_TTL_KEY, defaults.cache_ttl_days)?;
    if cache_ttl_days < 0 {
      return Err(ConfigError::Invalid {
        key: CACHE_TTL_KEY.to_string(),
        value: cache_ttl_days.to_string(),
      });
    }

    let adjustment_cap: f64 = parse_var(ADJUSTMENT_CAP_KEY, defaults.estimator.adjustment_cap)?;
    let uncertainty_margin: f64 = parse_var(UNCERTAINTY_MARGIN_KEY, defaults.estimator.uncertainty_margin)?;
    for (key, value) in [(ADJUSTMENT_CAP_KEY, adjustment_cap), (UNCERTAINTY_MARGIN_KEY, uncertainty_margin)] {
      if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
          key: key.to_string(),
          value: value.to_string(),
        });
      }
    }

    Ok(Self {
      db_path: env::var(DB_PATH_KEY)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(defaults.db_path),
      world_bank_url: env::var(WORLD_BANK_URL_KEY)
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(defaults.world_bank_url),
      online_lookup: parse_var(ONLINE_LOOKUP_KEY, defaults.online_lookup)?,
      cache_ttl_days,
      estimator: EstimatorParams {
        adjustment_cap,
        uncertainty_margin,
      },
    })
  }
}
