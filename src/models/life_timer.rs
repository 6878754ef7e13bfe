use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::life_expectancy::{LifeExpectancyEstimate, LifestyleProfile};

/// Setup answers for a life timer; the profile fields sit next to the birth date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeTimerData {
  pub birth_date: NaiveDate,
  #[serde(flatten)]
  pub profile: LifestyleProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeTimer {
  pub id: String,
  pub name: String,
  pub data: LifeTimerData,
  /// Estimate computed at creation; replaced wholesale on refresh
  pub result: LifeExpectancyEstimate,
  pub created_at: DateTime<Utc>,
}

impl LifeTimer {
  pub fn new(name: &str, data: LifeTimerData, result: LifeExpectancyEstimate, now: DateTime<Utc>) -> Self {
    let name = name.trim();
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name: if name.is_empty() { "Life".to_string() } else { name.to_string() },
      data,
      result,
      created_at: now,
    }
  }
}
