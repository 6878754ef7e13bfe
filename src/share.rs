//! Share links for custom timers
//!
//! A link carries the timer as base64 JSON plus a short checksum of the JSON
//! text. The checksum only catches truncated or mangled links; it is not a
//! signature.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::migrations::SCHEMA_VERSION;
use crate::models::Timer;
use crate::period::PeriodKind;
use crate::progress::DisplayMode;

pub const SHARE_SCHEME: &str = "fleetingtime";
/// Also accepted when parsing
const ALT_SHARE_SCHEME: &str = "fleeting-time";
const SHARE_PATH: &str = "timer";
const SHAREABLE_TYPE: &str = "custom";

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ShareError {
  #[error("Only custom timers with start and end dates can be shared")]
  NotShareable,

  #[error("Invalid share payload: {0}")]
  InvalidEncoding(String),

  #[error("Share link checksum does not match")]
  ChecksumMismatch,

  #[error("Invalid timer structure: {0}")]
  InvalidStructure(String),

  #[error("Not a timer share link: {0}")]
  InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareableTimer {
  pub version: u32,
  #[serde(rename = "type")]
  pub timer_type: String,
  pub name: String,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub mode: DisplayMode,
}

impl ShareableTimer {
  pub fn from_timer(timer: &Timer) -> Result<Self, ShareError> {
    if timer.timer_type != PeriodKind::Custom {
      return Err(ShareError::NotShareable);
    }
    let (start_date, end_date) = timer.custom_interval().bounds().ok_or(ShareError::NotShareable)?;

    Ok(Self {
      version: SCHEMA_VERSION,
      timer_type: SHAREABLE_TYPE.to_string(),
      name: timer.name.clone(),
      start_date,
      end_date,
      mode: timer.mode,
    })
  }

  /// Fresh local timer from a received link
  pub fn into_timer(self, now: DateTime<Utc>) -> Timer {
    Timer::new_custom(&self.name, self.start_date, self.end_date, self.mode, now)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
  pub payload: String,
  pub checksum: String,
}

/// 32-bit shift-subtract string hash over UTF-16 units, |h| in base 36,
/// first 8 characters
pub fn checksum(data: &str) -> String {
  let mut hash: i32 = 0;
  for unit in data.encode_utf16() {
    hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
  }
  let mut value = (hash as i64).unsigned_abs();

  let mut digits = Vec::new();
  loop {
    let digit = (value % 36) as u32;
    digits.push(std::char::from_digit(digit, 36).unwrap_or('0'));
    value /= 36;
    if value == 0 {
      break;
    }
  }
  digits.iter().rev().take(8).collect()
}

pub fn encode(timer: &Timer) -> Result<ShareLink, ShareError> {
  let shareable = ShareableTimer::from_timer(timer)?;
  let json = serde_json::to_string(&shareable).map_err(|e| ShareError::InvalidStructure(e.to_string()))?;

  Ok(ShareLink {
    payload: STANDARD.encode(json.as_bytes()),
    checksum: checksum(&json),
  })
}

pub fn decode(link: &ShareLink) -> Result<ShareableTimer, ShareError> {
  let bytes = STANDARD
    .decode(link.payload.trim())
    .map_err(|e| ShareError::InvalidEncoding(e.to_string()))?;
  let json = String::from_utf8(bytes).map_err(|e| ShareError::InvalidEncoding(e.to_string()))?;

  if checksum(&json) != link.checksum {
    log::warn!("Rejected share link: checksum mismatch");
    return Err(ShareError::ChecksumMismatch);
  }

  let shareable: ShareableTimer = serde_json::from_str(&json).map_err(|e| {
    log::warn!("Rejected share link: {}", e);
    ShareError::InvalidStructure(e.to_string())
  })?;

  if shareable.timer_type != SHAREABLE_TYPE {
    log::warn!("Rejected share link: type {}", shareable.timer_type);
    return Err(ShareError::InvalidStructure(format!(
      "unsupported timer type {}",
      shareable.timer_type
    )));
  }

  Ok(shareable)
}

/// `fleetingtime://timer?p=<payload>&c=<checksum>`
pub fn share_url(timer: &Timer) -> Result<String, ShareError> {
  let link = encode(timer)?;
  let mut url = Url::parse(&format!("{}://{}", SHARE_SCHEME, SHARE_PATH))
    .map_err(|e| ShareError::InvalidUrl(e.to_string()))?;
  url
    .query_pairs_mut()
    .append_pair("p", &link.payload)
    .append_pair("c", &link.checksum);
  Ok(url.to_string())
}

pub fn parse_share_url(raw: &str) -> Result<ShareableTimer, ShareError> {
  let url = Url::parse(raw.trim()).map_err(|e| ShareError::InvalidUrl(e.to_string()))?;
  if url.scheme() != SHARE_SCHEME && url.scheme() != ALT_SHARE_SCHEME {
    return Err(ShareError::InvalidUrl(raw.to_string()));
  }

  let target = url
    .host_str()
    .filter(|host| !host.is_empty())
    .unwrap_or_else(|| url.path().trim_start_matches('/'));
  if target != SHARE_PATH {
    return Err(ShareError::InvalidUrl(raw.to_string()));
  }

  let mut payload = None;
  let mut checksum = None;
  for (key, value) in url.query_pairs() {
    match key.as_ref() {
      "p" => payload = Some(value.into_owned()),
      "c" => checksum = Some(value.into_owned()),
      _ => {}
    }
  }

  match (payload, checksum) {
    (Some(payload), Some(checksum)) if !payload.is_empty() && !checksum.is_empty() => {
      decode(&ShareLink { payload, checksum })
    }
    _ => Err(ShareError::InvalidUrl(raw.to_string())),
  }
}

/// Message for the platform share sheet
pub fn share_text(timer: &Timer) -> String {
  let mut text = format!("Check out my timer \"{}\"", timer.name);
  if let Some(end) = timer.end_date {
    text.push_str(&format!(" ending on {}", end.format("%Y-%m-%d")));
  }
  text.push_str("\n\nTrack your time with Fleeting Time!");
  if let Ok(url) = share_url(timer) {
    text.push_str(&format!("\n\n{}", url));
  }
  text
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
