//! Life-Expectancy Estimator
//!
//! Baseline lookup by country and sex, plus a capped additive adjustment
//! from self-reported lifestyle factors. The result carries a fixed
//! uncertainty band around the adjusted figure.
//!
//! Entertainment-grade only:
//! - baselines are population averages, not individual predictions
//! - adjustment weights are round numbers, not fitted coefficients
//! - the cap and the band are parameters, see [`EstimatorParams`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::progress::clamp;

const BUNDLED_DATASET: &str = include_str!("../data/life_expectancy.json");
const DEFAULT_KEY: &str = "DEFAULT";
const GLOBAL_AVERAGE_YEARS: f64 = 73.4;
const GLOBAL_AVERAGE_SOURCE: &str = "Global average (fallback)";

pub const DISCLAIMER: &str = "This estimate is based on population statistics and self-reported \
lifestyle factors. It is for informational and entertainment purposes only. This is NOT medical \
advice. Individual outcomes vary significantly based on genetics, healthcare access, lifestyle \
choices, environmental factors, and countless other variables not captured here. Consult \
healthcare professionals for personal health guidance.";

// ---------------------------------------------------------------------------
/// Lifestyle Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unspecified => "unspecified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    #[default]
    Never,
    Former,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Moderate,
    Active,
}

/// Did at least one parent reach 85
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentLongevity {
    Yes,
    No,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChronicCondition {
    Cardiovascular,
    Diabetes,
    Cancer,
    Respiratory,
    Other,
}

impl ChronicCondition {
    pub const ALL: [ChronicCondition; 5] = [
        Self::Cardiovascular,
        Self::Diabetes,
        Self::Cancer,
        Self::Respiratory,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardiovascular => "cardiovascular",
            Self::Diabetes => "diabetes",
            Self::Cancer => "cancer",
            Self::Respiratory => "respiratory",
            Self::Other => "other",
        }
    }

    fn detail(&self) -> (&'static str, f64) {
        match self {
            Self::Cardiovascular => ("Cardiovascular condition", -4.0),
            Self::Diabetes => ("Diabetes", -3.0),
            Self::Cancer => ("Cancer history", -4.0),
            Self::Respiratory => ("Respiratory condition", -3.0),
            Self::Other => ("Other chronic condition", -2.0),
        }
    }
}

impl std::str::FromStr for ChronicCondition {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown chronic condition: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleProfile {
    /// ISO 3166-1 alpha-2
    pub country: String,
    pub sex: Sex,
    pub smoking_status: SmokingStatus,
    pub activity_level: ActivityLevel,
    #[serde(rename = "parentReached85")]
    pub parent_reached_85: ParentLongevity,
    #[serde(default)]
    pub chronic_conditions: BTreeSet<ChronicCondition>,
}

impl Default for LifestyleProfile {
    fn default() -> Self {
        Self {
            country: "DE".to_string(),
            sex: Sex::default(),
            smoking_status: SmokingStatus::default(),
            activity_level: ActivityLevel::default(),
            parent_reached_85: ParentLongevity::default(),
            chronic_conditions: BTreeSet::new(),
        }
    }
}

// ---------------------------------------------------------------------------
/// Estimator Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    /// Total adjustment is clamped to +/- this many years
    pub adjustment_cap: f64,
    /// Half-width of the reported range around the adjusted estimate
    pub uncertainty_margin: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            adjustment_cap: 10.0,
            uncertainty_margin: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
/// Lifestyle Adjustment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentDetail {
    pub factor: String,
    pub adjustment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Capped total, what the estimate uses
    pub adjustment: f64,
    /// Sum before the cap
    pub uncapped: f64,
    pub details: Vec<AdjustmentDetail>,
}

/// Additive lifestyle rules. The cap applies to the sum, not to each factor.
pub fn compute_adjustment(profile: &LifestyleProfile, params: &EstimatorParams) -> Adjustment {
    let mut details = Vec::new();

    match profile.smoking_status {
        SmokingStatus::Current => details.push(("Current smoker", -6.0)),
        SmokingStatus::Former => details.push(("Former smoker", -2.0)),
        SmokingStatus::Never => {}
    }

    match profile.activity_level {
        ActivityLevel::Active => details.push(("Active lifestyle", 3.0)),
        ActivityLevel::Moderate => details.push(("Moderate activity", 1.5)),
        ActivityLevel::Sedentary => details.push(("Sedentary lifestyle", -1.0)),
    }

    if profile.parent_reached_85 == ParentLongevity::Yes {
        details.push(("Parent reached 85+", 2.0));
    }

    for condition in &profile.chronic_conditions {
        details.push(condition.detail());
    }

    let uncapped: f64 = details.iter().map(|(_, years)| years).sum();
    let cap = params.adjustment_cap.abs();

    Adjustment {
        adjustment: clamp(uncapped, -cap, cap),
        uncapped,
        details: details
            .into_iter()
            .map(|(factor, adjustment)| AdjustmentDetail {
                factor: factor.to_string(),
                adjustment,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
/// Baseline Data Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub years: f64,
    pub source: String,
}

/// Where baseline life expectancy comes from. The bundled table is the
/// default; an online-backed cache can stand in for it.
pub trait LifeExpectancyDataSource {
    fn baseline(&self, country: &str, sex: Sex) -> Baseline;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStats {
    pub name: String,
    pub name_local: String,
    pub total: f64,
    pub male: f64,
    pub female: f64,
}

impl CountryStats {
    pub fn for_sex(&self, sex: Sex) -> f64 {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
            Sex::Unspecified => self.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dataset {
    source: String,
    generated_at: String,
    note: String,
    countries: BTreeMap<String, CountryStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryInfo {
    pub code: String,
    pub name: String,
    pub name_local: String,
}

/// Static per-country table compiled into the binary
#[derive(Debug, Clone)]
pub struct OfflineTable {
    dataset: Dataset,
}

impl OfflineTable {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json)
            .map(|dataset| Self { dataset })
            .map_err(|e| format!("Failed to parse life expectancy dataset: {}", e))
    }

    /// The bundled dataset, parsed once
    pub fn bundled() -> &'static OfflineTable {
        static TABLE: OnceLock<OfflineTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            Self::from_json(BUNDLED_DATASET).unwrap_or_else(|e| {
                log::error!("{}; using global average only", e);
                Self {
                    dataset: Dataset {
                        source: GLOBAL_AVERAGE_SOURCE.to_string(),
                        generated_at: String::new(),
                        note: String::new(),
                        countries: BTreeMap::new(),
                    },
                }
            })
        })
    }

    pub fn source(&self) -> &str {
        &self.dataset.source
    }

    /// Stats for a country code (case-insensitive), falling back to DEFAULT
    pub fn stats(&self, country: &str) -> Option<&CountryStats> {
        let code = country.trim().to_uppercase();
        self.dataset
            .countries
            .get(&code)
            .or_else(|| self.dataset.countries.get(DEFAULT_KEY))
    }

    pub fn contains(&self, country: &str) -> bool {
        let code = country.trim().to_uppercase();
        code != DEFAULT_KEY && self.dataset.countries.contains_key(&code)
    }

    /// Baseline years for a country and sex; unknown codes use the global average
    pub fn lookup_baseline(&self, country: &str, sex: Sex) -> f64 {
        self.stats(country)
            .map(|stats| stats.for_sex(sex))
            .unwrap_or(GLOBAL_AVERAGE_YEARS)
    }

    /// Selectable countries sorted by English name
    pub fn countries(&self) -> Vec<CountryInfo> {
        let mut list: Vec<CountryInfo> = self
            .dataset
            .countries
            .iter()
            .filter(|(code, _)| code.as_str() != DEFAULT_KEY)
            .map(|(code, stats)| CountryInfo {
                code: code.clone(),
                name: stats.name.clone(),
                name_local: stats.name_local.clone(),
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }
}

impl LifeExpectancyDataSource for OfflineTable {
    fn baseline(&self, country: &str, sex: Sex) -> Baseline {
        match self.stats(country) {
            Some(stats) => Baseline {
                years: stats.for_sex(sex),
                source: self.dataset.source.clone(),
            },
            None => Baseline {
                years: GLOBAL_AVERAGE_YEARS,
                source: GLOBAL_AVERAGE_SOURCE.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
/// Estimate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeExpectancyEstimate {
    pub baseline_years: f64,
    pub adjusted_years: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub source: String,
    /// When the estimate was computed; bookkeeping for the storage layer
    pub fetched_at: DateTime<Utc>,
}

/// Combine a baseline and the profile's capped adjustment
pub fn estimate_from_baseline(
    baseline: Baseline,
    profile: &LifestyleProfile,
    params: &EstimatorParams,
    now: DateTime<Utc>,
) -> LifeExpectancyEstimate {
    let adjustment = compute_adjustment(profile, params);
    let adjusted_years = baseline.years + adjustment.adjustment;
    let margin = params.uncertainty_margin.abs();

    LifeExpectancyEstimate {
        baseline_years: baseline.years,
        adjusted_years,
        range_min: adjusted_years - margin,
        range_max: adjusted_years + margin,
        source: baseline.source,
        fetched_at: now,
    }
}

/// Full estimate for a profile against any data source
pub fn estimate<S: LifeExpectancyDataSource + ?Sized>(
    profile: &LifestyleProfile,
    source: &S,
    params: &EstimatorParams,
    now: DateTime<Utc>,
) -> LifeExpectancyEstimate {
    let baseline = source.baseline(&profile.country, profile.sex);
    estimate_from_baseline(baseline, profile, params, now)
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use chrono::TimeZone;

    fn profile() -> LifestyleProfile {
        LifestyleProfile {
            country: "DE".to_string(),
            sex: Sex::Male,
            smoking_status: SmokingStatus::Never,
            activity_level: ActivityLevel::Active,
            parent_reached_85: ParentLongevity::Yes,
            chronic_conditions: BTreeSet::new(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    struct FixedSource(f64);

    impl LifeExpectancyDataSource for FixedSource {
        fn baseline(&self, _country: &str, _sex: Sex) -> Baseline {
            Baseline {
                years: self.0,
                source: "fixed".to_string(),
            }
        }
    }

    #[test]
    fn test_bundled_dataset_parses() {
        let table = OfflineTable::from_json(BUNDLED_DATASET).expect("bundled JSON should parse");
        assert!(table.contains("DE"));
        assert!(!table.contains("DEFAULT"));
        assert_eq!(table.source(), "WHO 2023 estimates (bundled)");
    }

    #[test]
    fn test_lookup_baseline_by_sex() {
        let table = OfflineTable::bundled();
        assert_eq!(table.lookup_baseline("DE", Sex::Male), 78.8);
        assert_eq!(table.lookup_baseline("DE", Sex::Female), 83.5);
        assert_eq!(table.lookup_baseline("DE", Sex::Unspecified), 81.3);
        assert_eq!(table.lookup_baseline("jp", Sex::Female), 87.1);
    }

    #[test]
    fn test_unknown_country_falls_back_to_default() {
        let table = OfflineTable::bundled();
        assert_eq!(table.lookup_baseline("ZZ", Sex::Unspecified), 73.4);
        assert_eq!(table.lookup_baseline("ZZ", Sex::Male), 70.8);
        assert_eq!(table.baseline("", Sex::Female).years, 76.0);
    }

    #[test]
    fn test_table_without_default_uses_global_average() {
        let table = OfflineTable::from_json(
            r#"{"source":"tiny","generatedAt":"","note":"","countries":{}}"#,
        )
        .unwrap();
        let baseline = table.baseline("DE", Sex::Male);
        assert_eq!(baseline.years, 73.4);
        assert_eq!(baseline.source, "Global average (fallback)");
    }

    #[test]
    fn test_countries_sorted_without_default() {
        let countries = OfflineTable::bundled().countries();
        assert_eq!(countries.len(), 21);
        assert!(countries.iter().all(|c| c.code != "DEFAULT"));
        assert_eq!(countries.first().map(|c| c.name.as_str()), Some("Australia"));
        assert!(countries.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn test_adjustment_rules() {
        let params = EstimatorParams::default();

        let adj = compute_adjustment(&profile(), &params);
        assert_eq!(adj.adjustment, 5.0);
        assert_eq!(adj.details.len(), 2);

        let mut p = profile();
        p.smoking_status = SmokingStatus::Former;
        p.activity_level = ActivityLevel::Moderate;
        p.parent_reached_85 = ParentLongevity::Unknown;
        let adj = compute_adjustment(&p, &params);
        assert_eq!(adj.adjustment, -0.5);
        assert_eq!(adj.details[0].factor, "Former smoker");
        assert_eq!(adj.details[1].adjustment, 1.5);
    }

    #[test]
    fn test_never_smoker_has_no_detail_entry() {
        let adj = compute_adjustment(&profile(), &EstimatorParams::default());
        assert!(adj.details.iter().all(|d| !d.factor.contains("smoker")));
    }

    #[test]
    fn test_chronic_conditions_are_additive() {
        let mut p = profile();
        p.activity_level = ActivityLevel::Sedentary;
        p.parent_reached_85 = ParentLongevity::No;
        p.chronic_conditions = [ChronicCondition::Diabetes, ChronicCondition::Other]
            .into_iter()
            .collect();

        let adj = compute_adjustment(&p, &EstimatorParams::default());
        assert_eq!(adj.adjustment, -6.0);
        assert_eq!(adj.details.len(), 3);
    }

    #[test]
    fn test_adjustment_capped_at_minus_ten() {
        let mut p = profile();
        p.smoking_status = SmokingStatus::Current;
        p.activity_level = ActivityLevel::Sedentary;
        p.parent_reached_85 = ParentLongevity::No;
        p.chronic_conditions = [ChronicCondition::Cardiovascular, ChronicCondition::Diabetes]
            .into_iter()
            .collect();

        let adj = compute_adjustment(&p, &EstimatorParams::default());
        assert_eq!(adj.uncapped, -14.0);
        assert_eq!(adj.adjustment, -10.0);
    }

    #[test]
    fn test_cap_is_configurable() {
        let params = EstimatorParams {
            adjustment_cap: 3.0,
            uncertainty_margin: 4.0,
        };
        assert_eq!(compute_adjustment(&profile(), &params).adjustment, 3.0);
    }

    #[test]
    fn test_estimate_range_and_source() {
        let now = fixed_now();
        let result = estimate(&profile(), OfflineTable::bundled(), &EstimatorParams::default(), now);

        assert_eq!(result.baseline_years, 78.8);
        assert_approx_eq!(result.adjusted_years, 83.8, 1e-9);
        assert_approx_eq!(result.range_min, result.adjusted_years - 4.0, 1e-12);
        assert_approx_eq!(result.range_max, result.adjusted_years + 4.0, 1e-12);
        assert_eq!(result.source, "WHO 2023 estimates (bundled)");
        assert_eq!(result.fetched_at, now);
    }

    #[test]
    fn test_estimate_with_injected_source() {
        let result = estimate(&profile(), &FixedSource(80.0), &EstimatorParams::default(), fixed_now());
        assert_eq!(result.adjusted_years, 85.0);
        assert_eq!((result.range_min, result.range_max), (81.0, 89.0));
        assert_eq!(result.source, "fixed");
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = estimate(&profile(), OfflineTable::bundled(), &EstimatorParams::default(), fixed_now());
        let b = estimate(&profile(), OfflineTable::bundled(), &EstimatorParams::default(), fixed_now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_profile_json_shape() {
        let json = r#"{
            "country": "FR",
            "sex": "female",
            "smokingStatus": "current",
            "activityLevel": "sedentary",
            "parentReached85": "yes",
            "chronicConditions": ["cancer", "respiratory"]
        }"#;
        let p: LifestyleProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.sex, Sex::Female);
        assert_eq!(p.parent_reached_85, ParentLongevity::Yes);
        assert!(p.chronic_conditions.contains(&ChronicCondition::Cancer));
        assert_eq!(p.chronic_conditions.len(), 2);
    }

    #[test]
    fn test_chronic_condition_parse() {
        assert_eq!("diabetes".parse::<ChronicCondition>(), Ok(ChronicCondition::Diabetes));
        assert!("none".parse::<ChronicCondition>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn adjustment_never_exceeds_cap(mask in 0u8..32, smoking in 0usize..3, activity in 0usize..3, cap in 0.0f64..15.0) {
            let profile = LifestyleProfile {
                smoking_status: [SmokingStatus::Never, SmokingStatus::Former, SmokingStatus::Current][smoking],
                activity_level: [ActivityLevel::Sedentary, ActivityLevel::Moderate, ActivityLevel::Active][activity],
                chronic_conditions: ChronicCondition::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, c)| *c)
                    .collect(),
                ..LifestyleProfile::default()
            };
            let params = EstimatorParams { adjustment_cap: cap, ..EstimatorParams::default() };

            let adj = compute_adjustment(&profile, &params);
            proptest::prop_assert!(adj.adjustment.abs() <= cap + 1e-9);
            proptest::prop_assert_eq!(adj.adjustment, adj.uncapped.clamp(-cap, cap));
        }
    }
}
