pub mod types;

use std::path::Path;

use crate::error::{Result, ScraperError};
use types::Config;

pub const ENV_REMOTE_ENDPOINT: &str = "BROWSER_WS_ENDPOINT";
pub const ENV_ALERT_THRESHOLD: &str = "PRICE_ALERT_THRESHOLD";
pub const ENV_DEBUG_SCREENSHOTS: &str = "DEBUG_SCREENSHOTS";

pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        // An empty file deserializes to unit, not to a defaulted struct.
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yml::from_str(&content)?
        }
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Layer environment overrides on top of file/default values.
pub fn apply_env_overrides(
    mut config: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    if let Some(endpoint) = lookup(ENV_REMOTE_ENDPOINT)
        && !endpoint.trim().is_empty()
    {
        config.browser.remote_endpoint = Some(endpoint.trim().to_string());
    }

    if let Some(raw) = lookup(ENV_ALERT_THRESHOLD) {
        let threshold: f64 = raw.trim().parse().map_err(|_| {
            ScraperError::Config(format!("{ENV_ALERT_THRESHOLD} must be a number, got '{raw}'"))
        })?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ScraperError::Config(format!(
                "{ENV_ALERT_THRESHOLD} must be a non-negative number, got '{raw}'"
            )));
        }
        config.alerts.threshold = threshold;
    }

    if let Some(raw) = lookup(ENV_DEBUG_SCREENSHOTS) {
        config.output.debug_screenshots = parse_flag(&raw).ok_or_else(|| {
            ScraperError::Config(format!(
                "{ENV_DEBUG_SCREENSHOTS} must be a boolean flag, got '{raw}'"
            ))
        })?;
    }

    Ok(config)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Checks that must pass before any browser is started.
    pub fn validate(&self) -> Result<()> {
        if self.browser.remote
            && self
                .browser
                .remote_endpoint
                .as_deref()
                .is_none_or(|e| e.trim().is_empty())
        {
            return Err(ScraperError::Config(format!(
                "remote browser requested but no endpoint configured (set {ENV_REMOTE_ENDPOINT} or browser.remote_endpoint)"
            )));
        }
        if self.site.form.search_buttons.is_empty() {
            return Err(ScraperError::Config(
                "site.form.search_buttons must list at least one selector".into(),
            ));
        }
        Ok(())
    }
}
