use serde::{Deserialize, Serialize};

use crate::calendar::WeekStart;
use crate::format::PercentDecimals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  Light,
  Dark,
  #[default]
  System,
}

impl Theme {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Light => "light",
      Self::Dark => "dark",
      Self::System => "system",
    }
  }
}

impl std::str::FromStr for Theme {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "light" => Ok(Self::Light),
      "dark" => Ok(Self::Dark),
      "system" => Ok(Self::System),
      _ => Err(format!("Unknown theme: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  pub theme: Theme,
  pub week_start: WeekStart,
  pub percent_decimals: PercentDecimals,
}
