//! Home-screen widget snapshot

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::WeekStart;
use crate::format::display_time_text;
use crate::models::Timer;
use crate::period::timer_raw_progress;

/// Pre-formatted values a widget renders without touching the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
  pub timer_id: String,
  pub timer_name: String,
  pub percent: f64,
  pub display_text: String,
  pub updated_at: DateTime<Utc>,
}

/// The configured timer if it still exists, else the first one
pub fn select_widget_timer<'a>(timers: &'a [Timer], configured_id: Option<&str>) -> Option<&'a Timer> {
  configured_id
    .and_then(|id| timers.iter().find(|t| t.id == id))
    .or_else(|| timers.first())
}

/// `None` for a custom timer that has no dates yet; the widget shows its
/// placeholder then. Calendar periods follow the time zone of `now`.
pub fn widget_snapshot<Tz: TimeZone>(timer: &Timer, week_start: WeekStart, now: &DateTime<Tz>) -> Option<WidgetData> {
  if timer.is_custom() && timer.custom_interval().bounds().is_none() {
    return None;
  }

  let mode = timer.effective_mode();
  let progress = timer_raw_progress(timer, week_start, now);

  Some(WidgetData {
    timer_id: timer.id.clone(),
    timer_name: timer.name.clone(),
    percent: progress.for_display(mode).percent,
    display_text: display_time_text(&progress, mode),
    updated_at: now.with_timezone(&Utc),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::period::PeriodKind;
  use crate::progress::DisplayMode;
  use crate::test_utils::{mock_custom_timer, mock_period_timer};
  use chrono::{Duration, FixedOffset};

  fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
  }

  #[test]
  fn test_snapshot_remaining_mode() {
    let mut timer = mock_custom_timer("Launch", start(), start() + Duration::days(4));
    timer.view_mode = Some(DisplayMode::Remaining);

    let data = widget_snapshot(&timer, WeekStart::Monday, &(start() + Duration::days(1))).unwrap();
    assert_eq!(data.percent, 75.0);
    assert_eq!(data.display_text, "3d left");
    assert_eq!(data.timer_name, "Launch");
  }

  #[test]
  fn test_snapshot_elapsed_mode() {
    let timer = mock_custom_timer("Launch", start(), start() + Duration::days(4));
    let data = widget_snapshot(&timer, WeekStart::Monday, &(start() + Duration::hours(30))).unwrap();
    assert_eq!(data.percent, 31.25);
    assert_eq!(data.display_text, "1d 6h elapsed");
  }

  #[test]
  fn test_custom_without_dates_has_no_snapshot() {
    let mut timer = mock_custom_timer("Draft", start(), start());
    timer.end_date = None;
    assert!(widget_snapshot(&timer, WeekStart::Monday, &start()).is_none());

    let day = mock_period_timer(PeriodKind::Day);
    assert!(widget_snapshot(&day, WeekStart::Monday, &start()).is_some());
  }

  #[test]
  fn test_day_snapshot_uses_local_midnight() {
    // 23:30 UTC on the 14th is 00:30 on the 15th at +01:00
    let offset = FixedOffset::east_opt(3600).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 14, 23, 30, 0).unwrap().with_timezone(&offset);
    let day = mock_period_timer(PeriodKind::Day);

    let data = widget_snapshot(&day, WeekStart::Monday, &now).unwrap();
    let dashboard = timer_raw_progress(&day, WeekStart::Monday, &now);
    assert!((data.percent - dashboard.percent).abs() < 1e-9);
    assert!(data.percent < 5.0);
    assert_eq!(data.updated_at, Utc.with_ymd_and_hms(2024, 6, 14, 23, 30, 0).unwrap());
  }

  #[test]
  fn test_select_widget_timer() {
    let timers = vec![mock_period_timer(PeriodKind::Day), mock_period_timer(PeriodKind::Year)];
    let year_id = timers[1].id.clone();

    assert_eq!(select_widget_timer(&timers, Some(&year_id)).map(|t| t.timer_type), Some(PeriodKind::Year));
    assert_eq!(select_widget_timer(&timers, Some("gone")).map(|t| t.timer_type), Some(PeriodKind::Day));
    assert!(select_widget_timer(&[], None).is_none());
  }
}
