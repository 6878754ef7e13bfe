//! World Bank life-expectancy lookup
//!
//! Optional online baseline source. Values are cached per country/sex for a
//! fixed TTL; anything that goes wrong falls back to the bundled table.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::life_expectancy::{Baseline, LifeExpectancyDataSource, OfflineTable, Sex};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const DEFAULT_WORLD_BANK_URL: &str = "https://api.worldbank.org/v2";
const DATE_RANGE: &str = "2020:2023";
const PER_PAGE: &str = "10";

pub const SOURCE_FETCHED: &str = "World Bank API";
pub const SOURCE_CACHED: &str = "World Bank (cached)";
pub const SOURCE_FALLBACK: &str = "Estimated (offline fallback)";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum WorldBankError {
  #[error("HTTP request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Unexpected response shape: {0}")]
  Parse(String),

  #[error("No life expectancy value for {0}")]
  NoData(String),
}

impl From<reqwest::Error> for WorldBankError {
  fn from(e: reqwest::Error) -> Self {
    WorldBankError::Request(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// API Client
/// ---------------------------------------------------------------------------

/// One row of the indicator series; `value` is null for years not yet published
#[derive(Debug, Deserialize)]
struct IndicatorEntry {
  value: Option<f64>,
  #[allow(dead_code)]
  date: String,
}

pub fn indicator(sex: Sex) -> &'static str {
  match sex {
    Sex::Male => "SP.DYN.LE00.MA.IN",
    Sex::Female => "SP.DYN.LE00.FE.IN",
    Sex::Unspecified => "SP.DYN.LE00.IN",
  }
}

#[derive(Debug, Clone)]
pub struct WorldBankClient {
  client: Client,
  base_url: String,
}

impl WorldBankClient {
  pub fn new(base_url: &str) -> Self {
    Self {
      client: Client::new(),
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  /// Most recent non-null value in the 2020-2023 window
  pub async fn fetch_life_expectancy(&self, country: &str, sex: Sex) -> Result<f64, WorldBankError> {
    let code = country.trim().to_uppercase();
    let url = format!("{}/country/{}/indicator/{}", self.base_url, code, indicator(sex));

    log::debug!("Fetching life expectancy from {}", url);

    let response = self
      .client
      .get(&url)
      .query(&[("format", "json"), ("date", DATE_RANGE), ("per_page", PER_PAGE)])
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(WorldBankError::Api(format!("{}: {}", status, body)));
    }

    // The API answers with [metadata, rows]
    let body: serde_json::Value = response.json().await?;
    let rows = body
      .as_array()
      .filter(|parts| parts.len() >= 2)
      .and_then(|parts| parts[1].as_array())
      .ok_or_else(|| WorldBankError::Parse(format!("expected [metadata, data] for {}", code)))?;

    rows
      .iter()
      .filter_map(|row| serde_json::from_value::<IndicatorEntry>(row.clone()).ok())
      .find_map(|entry| entry.value)
      .ok_or_else(|| WorldBankError::NoData(format!("{} ({})", code, sex.as_str())))
  }
}

/// ---------------------------------------------------------------------------
/// Baseline Cache
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
  pub years: f64,
  pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BaselineCache {
  entries: HashMap<String, CacheEntry>,
  ttl: Duration,
}

impl BaselineCache {
  pub fn new(ttl_days: i64) -> Self {
    Self {
      entries: HashMap::new(),
      ttl: Duration::days(ttl_days),
    }
  }

  /// `"DE_male"`
  pub fn key(country: &str, sex: Sex) -> String {
    format!("{}_{}", country.trim().to_uppercase(), sex.as_str())
  }

  pub fn insert_entry(&mut self, key: String, entry: CacheEntry) {
    self.entries.insert(key, entry);
  }

  pub fn insert(&mut self, country: &str, sex: Sex, years: f64, fetched_at: DateTime<Utc>) -> String {
    let key = Self::key(country, sex);
    self.insert_entry(key.clone(), CacheEntry { years, fetched_at });
    key
  }

  fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
    now - entry.fetched_at <= self.ttl
  }

  /// Cached years if present and younger than the TTL
  pub fn get(&self, country: &str, sex: Sex, now: DateTime<Utc>) -> Option<f64> {
    self
      .entries
      .get(&Self::key(country, sex))
      .filter(|entry| self.is_fresh(entry, now))
      .map(|entry| entry.years)
  }

  /// Drop stale entries, returning how many were removed
  pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
    let before = self.entries.len();
    let ttl = self.ttl;
    self.entries.retain(|_, entry| now - entry.fetched_at <= ttl);
    before - self.entries.len()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Fresh cache entries first, bundled table otherwise
pub struct CachedSource<'a> {
  pub cache: &'a BaselineCache,
  pub fallback: &'a OfflineTable,
  pub now: DateTime<Utc>,
}

impl LifeExpectancyDataSource for CachedSource<'_> {
  fn baseline(&self, country: &str, sex: Sex) -> Baseline {
    match self.cache.get(country, sex, self.now) {
      Some(years) => Baseline {
        years,
        source: SOURCE_CACHED.to_string(),
      },
      None => self.fallback.baseline(country, sex),
    }
  }
}

/// Where a refreshed baseline came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineOrigin {
  Cached,
  Fetched,
  Fallback,
}

/// Cache hit, else fetch and remember, else the bundled value
pub async fn refresh_baseline(
  client: &WorldBankClient,
  cache: &mut BaselineCache,
  fallback: &OfflineTable,
  country: &str,
  sex: Sex,
  now: DateTime<Utc>,
) -> (Baseline, BaselineOrigin) {
  if let Some(years) = cache.get(country, sex, now) {
    log::debug!("Baseline cache hit for {}", BaselineCache::key(country, sex));
    return (
      Baseline {
        years,
        source: SOURCE_CACHED.to_string(),
      },
      BaselineOrigin::Cached,
    );
  }

  match client.fetch_life_expectancy(country, sex).await {
    Ok(years) => {
      let key = cache.insert(country, sex, years, now);
      log::info!("Fetched baseline {} = {:.1} years", key, years);
      (
        Baseline {
          years,
          source: SOURCE_FETCHED.to_string(),
        },
        BaselineOrigin::Fetched,
      )
    }
    Err(e) => {
      log::warn!("World Bank lookup failed, using bundled table: {}", e);
      (
        Baseline {
          years: fallback.lookup_baseline(country, sex),
          source: SOURCE_FALLBACK.to_string(),
        },
        BaselineOrigin::Fallback,
      )
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use mockito::Matcher;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
  }

  const SERIES: &str = r#"[
    {"page":1,"pages":1,"per_page":10,"total":4},
    [
      {"indicator":{"id":"SP.DYN.LE00.MA.IN"},"country":{"id":"DE"},"date":"2023","value":null},
      {"indicator":{"id":"SP.DYN.LE00.MA.IN"},"country":{"id":"DE"},"date":"2022","value":78.2},
      {"indicator":{"id":"SP.DYN.LE00.MA.IN"},"country":{"id":"DE"},"date":"2021","value":78.5}
    ]
  ]"#;

  #[tokio::test]
  async fn test_fetch_takes_first_non_null_value() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/country/DE/indicator/SP.DYN.LE00.MA.IN")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("format".into(), "json".into()),
        Matcher::UrlEncoded("date".into(), "2020:2023".into()),
        Matcher::UrlEncoded("per_page".into(), "10".into()),
      ]))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(SERIES)
      .create_async()
      .await;

    let client = WorldBankClient::new(&server.url());
    let years = client.fetch_life_expectancy("de", Sex::Male).await.unwrap();

    assert_eq!(years, 78.2);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_fetch_all_null_is_no_data() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/country/XK/indicator/SP.DYN.LE00.IN")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"[{"page":1},[{"date":"2023","value":null}]]"#)
      .create_async()
      .await;

    let client = WorldBankClient::new(&server.url());
    let err = client.fetch_life_expectancy("XK", Sex::Unspecified).await.unwrap_err();
    assert!(matches!(err, WorldBankError::NoData(_)));
  }

  #[tokio::test]
  async fn test_fetch_error_shapes() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/country/ZZ/indicator/SP.DYN.LE00.FE.IN")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"[{"message":[{"id":"120","value":"Invalid value"}]}]"#)
      .create_async()
      .await;
    server
      .mock("GET", "/country/FR/indicator/SP.DYN.LE00.FE.IN")
      .match_query(Matcher::Any)
      .with_status(502)
      .create_async()
      .await;

    let client = WorldBankClient::new(&server.url());
    assert!(matches!(
      client.fetch_life_expectancy("ZZ", Sex::Female).await,
      Err(WorldBankError::Parse(_))
    ));
    assert!(matches!(
      client.fetch_life_expectancy("FR", Sex::Female).await,
      Err(WorldBankError::Api(_))
    ));
  }

  #[test]
  fn test_cache_respects_ttl() {
    let mut cache = BaselineCache::new(30);
    cache.insert("de", Sex::Male, 78.2, now());

    assert_eq!(BaselineCache::key("de", Sex::Male), "DE_male");
    assert_eq!(cache.get("DE", Sex::Male, now() + Duration::days(30)), Some(78.2));
    assert_eq!(cache.get("DE", Sex::Male, now() + Duration::days(31)), None);
    assert_eq!(cache.get("DE", Sex::Female, now()), None);

    assert_eq!(cache.purge_expired(now() + Duration::days(31)), 1);
    assert!(cache.is_empty());
  }

  #[test]
  fn test_cached_source_falls_back_to_table() {
    let mut cache = BaselineCache::new(30);
    cache.insert("DE", Sex::Female, 83.9, now());
    let source = CachedSource {
      cache: &cache,
      fallback: OfflineTable::bundled(),
      now: now(),
    };

    let hit = source.baseline("DE", Sex::Female);
    assert_eq!(hit.years, 83.9);
    assert_eq!(hit.source, "World Bank (cached)");

    let miss = source.baseline("DE", Sex::Male);
    assert_eq!(miss.years, 78.8);
    assert_eq!(miss.source, "WHO 2023 estimates (bundled)");
  }

  #[tokio::test]
  async fn test_refresh_baseline_fetches_then_caches() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/country/DE/indicator/SP.DYN.LE00.MA.IN")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(SERIES)
      .expect(1)
      .create_async()
      .await;

    let client = WorldBankClient::new(&server.url());
    let mut cache = BaselineCache::new(30);
    let table = OfflineTable::bundled();

    let (first, origin) = refresh_baseline(&client, &mut cache, table, "DE", Sex::Male, now()).await;
    assert_eq!(origin, BaselineOrigin::Fetched);
    assert_eq!(first.source, "World Bank API");

    let (second, origin) = refresh_baseline(&client, &mut cache, table, "DE", Sex::Male, now()).await;
    assert_eq!(origin, BaselineOrigin::Cached);
    assert_eq!(second.years, first.years);
    assert_eq!(second.source, "World Bank (cached)");

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_refresh_baseline_falls_back_offline() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", Matcher::Any)
      .with_status(500)
      .create_async()
      .await;

    let client = WorldBankClient::new(&server.url());
    let mut cache = BaselineCache::new(30);
    let (baseline, origin) =
      refresh_baseline(&client, &mut cache, OfflineTable::bundled(), "JP", Sex::Female, now()).await;

    assert_eq!(origin, BaselineOrigin::Fallback);
    assert_eq!(baseline.years, 87.1);
    assert_eq!(baseline.source, "Estimated (offline fallback)");
    assert!(cache.is_empty());
  }
}
