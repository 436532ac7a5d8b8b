use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout { what: String, ms: u64 },

    #[error("No element matches {locator}")]
    ElementNotFound { locator: String },

    #[error("Navigation failed in state {state}: {reason}")]
    Navigation { state: String, reason: String },

    #[error("Extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("Invalid search request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ScraperError {
    /// Transient UI failures the driver recovers from locally.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ElementNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
