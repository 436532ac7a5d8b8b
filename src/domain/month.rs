use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "EUR";

/// Short display form of an ISO currency code; unknown codes are shown as is.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "EUR" => "€",
        "USD" => "$",
        "GBP" => "£",
        other => other,
    }
}

/// Aggregate of the prices observed for one navigated month.
///
/// When `available` is false every numeric field is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthPriceSummary {
    pub month: String,
    pub average: u32,
    pub min: u32,
    pub max: u32,
    pub count: usize,
    pub currency: String,
    pub available: bool,
}

impl MonthPriceSummary {
    pub fn unavailable(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            average: 0,
            min: 0,
            max: 0,
            count: 0,
            currency: DEFAULT_CURRENCY.into(),
            available: false,
        }
    }

    /// Summarize raw price observations. An empty slice yields an unavailable summary.
    pub fn from_observations(month: impl Into<String>, prices: &[u32]) -> Self {
        let (Some(&min), Some(&max)) = (prices.iter().min(), prices.iter().max()) else {
            return Self::unavailable(month);
        };
        Self {
            month: month.into(),
            average: rounded_mean(prices),
            min,
            max,
            count: prices.len(),
            currency: DEFAULT_CURRENCY.into(),
            available: true,
        }
    }
}

/// Mean rounded half away from zero, in integer arithmetic.
///
/// `round(a / b) == (2a + b) / (2b)` for non-negative integers.
pub fn rounded_mean(prices: &[u32]) -> u32 {
    if prices.is_empty() {
        return 0;
    }
    let sum: u64 = prices.iter().map(|&p| u64::from(p)).sum();
    let n = prices.len() as u64;
    let mean = (2 * sum + n) / (2 * n);
    // The mean never exceeds the largest observation.
    u32::try_from(mean).unwrap_or(u32::MAX)
}

impl std::fmt::Display for MonthPriceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.available {
            return write!(f, "{}: no flights available", self.month);
        }
        write!(
            f,
            "{}: avg {} {} (range {}-{}, {} flights)",
            self.month, self.average, self.currency, self.min, self.max, self.count
        )
    }
}
