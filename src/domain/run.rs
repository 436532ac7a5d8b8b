use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::flight::FlightRecord;
use super::month::{DEFAULT_CURRENCY, MonthPriceSummary};

pub const SCRAPER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timestamp used in artifact file names, e.g. `20260115_103000`.
pub fn file_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Everything a scrape produced; the only input of the report emitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub scrape_date: DateTime<Local>,
    pub origin: String,
    pub destination: String,
    #[serde(flatten)]
    pub entries: RunEntries,
    pub metadata: RunMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunEntries {
    Months {
        total_months: usize,
        months: Vec<MonthPriceSummary>,
    },
    Flights {
        depart_date: NaiveDate,
        return_date: NaiveDate,
        total_flights: usize,
        flights: Vec<FlightRecord>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub scraper_version: String,
    pub source: String,
}

impl RunMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            scraper_version: SCRAPER_VERSION.into(),
            source: source.into(),
        }
    }
}

impl RunResult {
    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }

    pub fn months(&self) -> &[MonthPriceSummary] {
        match &self.entries {
            RunEntries::Months { months, .. } => months,
            RunEntries::Flights { .. } => &[],
        }
    }

    pub fn flights(&self) -> &[FlightRecord] {
        match &self.entries {
            RunEntries::Flights { flights, .. } => flights,
            RunEntries::Months { .. } => &[],
        }
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            RunEntries::Months { months, .. } => months.len(),
            RunEntries::Flights { flights, .. } => flights.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Currency the run's prices are quoted in.
    pub fn currency(&self) -> &str {
        let first = match &self.entries {
            RunEntries::Months { months, .. } => months.first().map(|m| m.currency.as_str()),
            RunEntries::Flights { flights, .. } => flights.first().map(|f| f.currency.as_str()),
        };
        first.unwrap_or(DEFAULT_CURRENCY)
    }

    /// Months that actually had flights, in scrape order.
    pub fn available_months(&self) -> impl Iterator<Item = &MonthPriceSummary> {
        self.months().iter().filter(|m| m.available)
    }
}
