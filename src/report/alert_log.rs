use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::alerts::Alert;
use crate::error::Result;

/// On-disk shape of `price_alerts_<ts>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLog {
    pub total_alerts: usize,
    pub threshold: f64,
    pub generated_at: DateTime<Local>,
    pub alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new(threshold: f64, alerts: Vec<Alert>) -> Self {
        Self {
            total_alerts: alerts.len(),
            threshold,
            generated_at: Local::now(),
            alerts,
        }
    }
}

/// Writes the log and returns `true`; returns `false` without touching the
/// file system when there is nothing to report.
pub fn write_alert_log(alerts: &[Alert], threshold: f64, path: &Path) -> Result<bool> {
    if alerts.is_empty() {
        info!("No price alerts to save");
        return Ok(false);
    }
    let log = AlertLog::new(threshold, alerts.to_vec());
    std::fs::write(path, serde_json::to_string_pretty(&log)?)?;
    info!(path = %path.display(), count = log.total_alerts, "Alerts saved");
    Ok(true)
}

pub fn read_alert_log(path: &Path) -> Result<AlertLog> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alerts::PriceAlertSystem;
    use crate::test_helpers::{make_month, make_month_run};

    #[test]
    fn empty_alerts_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        assert!(!write_alert_log(&[], 150.0, &path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn log_carries_count_and_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        let run = make_month_run(vec![make_month("févr.", 120, 60, 180)]);
        let alerts = PriceAlertSystem::new(150.0).check_prices(&run);

        assert!(write_alert_log(&alerts, 150.0, &path).unwrap());
        let log = read_alert_log(&path).unwrap();
        assert_eq!(log.total_alerts, 2);
        assert!((log.threshold - 150.0).abs() < f64::EPSILON);
        assert_eq!(log.alerts, alerts);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("févr."));
        assert!(text.contains("\"type\": \"minimum_exceptional\""));
    }
}
