//! Share-link commands

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::models::Timer;
use crate::share::{parse_share_url, share_text, share_url};
use crate::store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareExport {
  pub url: String,
  pub text: String,
}

pub async fn export_share_url(state: &AppState, timer_id: String) -> Result<ShareExport, String> {
  let timer = store::load_timer(&state.db, &timer_id)
    .await?
    .ok_or_else(|| format!("Timer not found: {}", timer_id))?;

  Ok(ShareExport {
    url: share_url(&timer).map_err(|e| e.to_string())?,
    text: share_text(&timer),
  })
}

/// Decode a received link and store it as a new custom timer
pub async fn import_shared_timer(state: &AppState, url: String) -> Result<Timer, String> {
  let shareable = parse_share_url(&url).map_err(|e| e.to_string())?;
  let timer = shareable.into_timer(Utc::now());
  store::save_timer(&state.db, &timer).await?;

  log::info!("Imported shared timer {} ({})", timer.name, timer.id);
  Ok(timer)
}
