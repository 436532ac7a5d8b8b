pub mod alert_log;
pub mod chart;
pub mod export;
pub mod html;
pub mod summary;

use std::path::PathBuf;

use chrono::Local;
use tracing::{error, info};

use crate::domain::alerts::Alert;
use crate::domain::run::{RunResult, file_stamp};
use crate::error::Result;

/// Paths of everything one export produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub trends_chart: Option<PathBuf>,
    pub deals_chart: Option<PathBuf>,
    pub alerts: Option<PathBuf>,
}

/// Writes timestamped report files into one directory.
pub struct ReportWriter {
    dir: PathBuf,
    stamp: String,
}

impl ReportWriter {
    /// Stamped with the current local time.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_stamp(dir, file_stamp(&Local::now()))
    }

    pub fn with_stamp(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stamp: stamp.into(),
        }
    }

    /// `<dir>/<prefix>_<stamp>.<ext>`
    pub fn path(&self, prefix: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{prefix}_{}.{ext}", self.stamp))
    }

    /// JSON and CSV first (their failure aborts the export), then the HTML
    /// report and charts (failures logged), then the log of `alerts` when there are any.
    pub fn export_all(&self, run: &RunResult, alerts: &[Alert], threshold: f64) -> Result<Artifacts> {
        std::fs::create_dir_all(&self.dir)?;
        let mut artifacts = Artifacts::default();

        let json = self.path("flight_prices", "json");
        export::write_json(run, &json)?;
        artifacts.json = Some(json);

        let csv = self.path("flight_prices", "csv");
        export::write_csv(run, &csv)?;
        artifacts.csv = Some(csv);

        artifacts.html = self.write_text("flight_report", "html", Some(html::render_html(run)));
        artifacts.trends_chart =
            self.write_text("price_trends", "svg", chart::price_trends_svg(run));
        artifacts.deals_chart = self.write_text("best_deals", "svg", chart::best_deals_svg(run));

        let alert_path = self.path("price_alerts", "json");
        if alert_log::write_alert_log(alerts, threshold, &alert_path)? {
            artifacts.alerts = Some(alert_path);
        }

        info!(dir = %self.dir.display(), stamp = %self.stamp, "Export complete");
        Ok(artifacts)
    }

    fn write_text(&self, prefix: &str, ext: &str, content: Option<String>) -> Option<PathBuf> {
        let content = content?;
        let path = self.path(prefix, ext);
        match std::fs::write(&path, content) {
            Ok(()) => {
                info!(path = %path.display(), "{prefix} written");
                Some(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write {prefix}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::domain::alerts::PriceAlertSystem;
    use crate::domain::month::MonthPriceSummary;
    use crate::test_helpers::{make_month, make_month_run};

    #[test]
    fn paths_carry_stamp() {
        let writer = ReportWriter::with_stamp("/tmp/out", "20260115_103000");
        assert_eq!(
            writer.path("flight_prices", "json"),
            Path::new("/tmp/out/flight_prices_20260115_103000.json")
        );
    }

    #[test]
    fn export_all_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::with_stamp(dir.path().join("reports"), "20260115_103000");
        let run = make_month_run(vec![
            make_month("feb.", 120, 89, 180),
            make_month("mar.", 98, 60, 145),
        ]);
        let alerts = PriceAlertSystem::new(150.0).check_prices(&run);
        let artifacts = writer.export_all(&run, &alerts, 150.0).unwrap();

        for path in [
            &artifacts.json,
            &artifacts.csv,
            &artifacts.html,
            &artifacts.trends_chart,
            &artifacts.deals_chart,
            &artifacts.alerts,
        ] {
            assert!(path.as_ref().unwrap().exists());
        }
    }

    #[test]
    fn quiet_run_skips_charts_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::with_stamp(dir.path(), "x");
        let run = make_month_run(vec![MonthPriceSummary::unavailable("feb.")]);
        let artifacts = writer.export_all(&run, &[], 150.0).unwrap();

        assert!(artifacts.json.is_some());
        assert!(artifacts.html.is_some());
        assert!(artifacts.trends_chart.is_none());
        assert!(artifacts.deals_chart.is_none());
        assert!(artifacts.alerts.is_none());
    }
}
