//! Plain-text console summaries.

use std::fmt::Write;

use crate::domain::alerts::{Alert, Severity, get_best_month};
use crate::domain::run::RunResult;

const RULE: &str = "======================================================================";

/// Route, best month and alerts of a month run; cheapest flight of a flight run.
///
/// `alerts` are the ones [`check_prices`](crate::domain::alerts::PriceAlertSystem::check_prices)
/// produced for `run`.
pub fn create_alert_summary(run: &RunResult, alerts: &[Alert], threshold: f64) -> String {
    let currency = run.currency();
    let mut out = String::new();

    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "FLIGHT PRICE ANALYSIS: {}", run.route());
    let _ = writeln!(out, "{RULE}");

    if let Some(best) = get_best_month(run) {
        let _ = writeln!(out, "\n🏆 BEST MONTH TO FLY: {}", best.month);
        let _ = writeln!(out, "   Average: {} {}", best.average_price, best.currency);
        let _ = writeln!(
            out,
            "   Range: {} - {} {}",
            best.min_price, best.max_price, best.currency
        );
        let _ = writeln!(out, "   Available flights: {}", best.flights_count);
    }

    if let Some(cheapest) = run.flights().iter().filter(|f| f.price > 0).min_by_key(|f| f.price) {
        let _ = writeln!(
            out,
            "\n🏆 CHEAPEST FLIGHT: #{} {} {} with {}",
            cheapest.rank, cheapest.price, cheapest.currency, cheapest.airline
        );
        let _ = writeln!(
            out,
            "   Outbound: {} → {} ({})",
            cheapest.outbound_departure, cheapest.outbound_arrival, cheapest.outbound_stops
        );
    }

    if alerts.is_empty() {
        let _ = writeln!(out, "\n✓ No alerts - all prices above {threshold} {currency} threshold");
    } else {
        let _ = writeln!(
            out,
            "\n🔔 PRICE ALERTS ({} months below threshold of {threshold} {currency}):",
            alerts.len()
        );
        for alert in alerts {
            let _ = writeln!(
                out,
                "   {} {}: {} {}",
                severity_mark(alert.severity),
                alert.month,
                alert.price,
                alert.currency
            );
        }
    }

    let _ = writeln!(out, "\n{RULE}");
    out
}

fn severity_mark(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "⭐",
        Severity::High => "🎯",
    }
}

/// Alerts grouped by severity, exceptional deals first. `None` when empty.
pub fn alert_digest(alerts: &[Alert]) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }
    let mut out = String::new();
    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "🔔 PRICE ALERTS SUMMARY ({} alerts)", alerts.len());
    let _ = writeln!(out, "{RULE}");

    for (severity, heading) in [
        (Severity::Critical, "EXCEPTIONAL DEALS"),
        (Severity::High, "GOOD DEALS"),
    ] {
        let group: Vec<&Alert> = alerts.iter().filter(|a| a.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{} {heading} ({}):", severity_mark(severity), group.len());
        for alert in group {
            let _ = writeln!(
                out,
                "   • {}: {}{} - {}",
                alert.month, alert.price, alert.currency, alert.route
            );
        }
    }

    let _ = writeln!(out, "\n{RULE}");
    Some(out)
}
