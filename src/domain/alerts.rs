use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::run::RunResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    AverageBelowThreshold,
    MinimumExceptional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub month: String,
    pub price: u32,
    pub threshold: f64,
    pub currency: String,
    pub message: String,
    pub route: String,
    pub timestamp: DateTime<Local>,
}

/// Cheapest month of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMonth {
    pub month: String,
    pub average_price: u32,
    pub min_price: u32,
    pub max_price: u32,
    pub flights_count: usize,
    pub currency: String,
    pub route: String,
}

/// Watches month summaries against a price threshold.
#[derive(Debug, Clone)]
pub struct PriceAlertSystem {
    threshold: f64,
    alerts: Vec<Alert>,
}

impl PriceAlertSystem {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            alerts: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Every alert produced so far, across calls to [`check_prices`](Self::check_prices).
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Alerts for one run: `high` when `0 < average <= threshold`,
    /// `critical` when `0 < min <= threshold / 2`. Unavailable months are skipped.
    pub fn check_prices(&mut self, run: &RunResult) -> Vec<Alert> {
        let exceptional = self.threshold * 0.5;
        let route = run.route();
        let now = Local::now();
        let mut alerts = Vec::new();

        for month in run.available_months() {
            if month.average > 0 && f64::from(month.average) <= self.threshold {
                let alert = Alert {
                    kind: AlertKind::AverageBelowThreshold,
                    severity: Severity::High,
                    month: month.month.clone(),
                    price: month.average,
                    threshold: self.threshold,
                    currency: month.currency.clone(),
                    message: format!(
                        "Average price for {} is {}{} (threshold: {}{})",
                        month.month, month.average, month.currency, self.threshold, month.currency
                    ),
                    route: route.clone(),
                    timestamp: now,
                };
                warn!(month = %month.month, price = month.average, "{}", alert.message);
                alerts.push(alert);
            }

            if month.min > 0 && f64::from(month.min) <= exceptional {
                let alert = Alert {
                    kind: AlertKind::MinimumExceptional,
                    severity: Severity::Critical,
                    month: month.month.clone(),
                    price: month.min,
                    threshold: exceptional,
                    currency: month.currency.clone(),
                    message: format!(
                        "Exceptional: minimum price for {} is only {}{}",
                        month.month, month.min, month.currency
                    ),
                    route: route.clone(),
                    timestamp: now,
                };
                warn!(month = %month.month, price = month.min, "{}", alert.message);
                alerts.push(alert);
            }
        }

        if alerts.is_empty() {
            info!(threshold = self.threshold, "No price alerts, all prices above threshold");
        }
        self.alerts.extend(alerts.iter().cloned());
        alerts
    }
}

/// Available month with the lowest positive average; the earliest wins ties.
pub fn get_best_month(run: &RunResult) -> Option<BestMonth> {
    let best = run
        .available_months()
        .filter(|m| m.average > 0)
        .min_by_key(|m| m.average)?;
    Some(BestMonth {
        month: best.month.clone(),
        average_price: best.average,
        min_price: best.min,
        max_price: best.max,
        flights_count: best.count,
        currency: best.currency.clone(),
        route: run.route(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::month::MonthPriceSummary;
    use crate::test_helpers::{make_month, make_month_run};

    #[test]
    fn average_below_threshold_is_high() {
        let run = make_month_run(vec![make_month("feb.", 120, 100, 180)]);
        let alerts = PriceAlertSystem::new(150.0).check_prices(&run);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::AverageBelowThreshold);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[0].price, 120);
        assert_eq!(alerts[0].route, "Madrid → Paris");
    }

    #[test]
    fn exceptional_minimum_adds_critical() {
        let run = make_month_run(vec![make_month("feb.", 120, 60, 180)]);
        let alerts = PriceAlertSystem::new(150.0).check_prices(&run);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].kind, AlertKind::MinimumExceptional);
        assert_eq!(alerts[1].severity, Severity::Critical);
        assert_eq!(alerts[1].price, 60);
        assert!((alerts[1].threshold - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn expensive_month_has_no_alert() {
        let run = make_month_run(vec![make_month("feb.", 200, 180, 250)]);
        assert!(PriceAlertSystem::new(150.0).check_prices(&run).is_empty());
    }

    #[test]
    fn boundary_values_are_inclusive() {
        let run = make_month_run(vec![make_month("feb.", 150, 75, 200)]);
        let alerts = PriceAlertSystem::new(150.0).check_prices(&run);
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn unavailable_months_are_skipped() {
        let run = make_month_run(vec![MonthPriceSummary::unavailable("mar.")]);
        assert!(PriceAlertSystem::new(150.0).check_prices(&run).is_empty());
        assert!(get_best_month(&run).is_none());
    }

    #[test]
    fn alerts_accumulate_across_checks() {
        let mut system = PriceAlertSystem::new(150.0);
        let run = make_month_run(vec![make_month("feb.", 120, 100, 180)]);
        system.check_prices(&run);
        system.check_prices(&run);
        assert_eq!(system.alerts().len(), 2);
    }

    #[test]
    fn best_month_scenario() {
        let run = make_month_run(vec![
            make_month("feb.", 120, 89, 180),
            make_month("mar.", 98, 75, 145),
            make_month("apr.", 165, 120, 210),
        ]);
        let alerts = PriceAlertSystem::new(100.0).check_prices(&run);
        assert_eq!(alerts.len(), 1);
        assert!(alerts.iter().all(|a| a.month == "mar."));

        let best = get_best_month(&run).unwrap();
        assert_eq!(best.month, "mar.");
        assert_eq!(best.average_price, 98);
        assert_eq!(best.min_price, 75);
    }

    #[test]
    fn best_month_ties_keep_first() {
        let run = make_month_run(vec![
            make_month("feb.", 100, 90, 110),
            make_month("mar.", 100, 80, 120),
        ]);
        assert_eq!(get_best_month(&run).unwrap().month, "feb.");
    }

    #[test]
    fn alert_serializes_with_type_field() {
        let run = make_month_run(vec![make_month("feb.", 120, 100, 180)]);
        let alerts = PriceAlertSystem::new(150.0).check_prices(&run);
        let value = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(value["type"], "average_below_threshold");
        assert_eq!(value["severity"], "high");
    }
}
