use serde::{Deserialize, Serialize};

use super::month::DEFAULT_CURRENCY;

/// Placeholder for a card field that could not be located.
pub const NOT_AVAILABLE: &str = "N/A";

/// One scraped flight card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// 1-based position on the results page.
    pub rank: usize,
    pub price: u32,
    pub airline: String,
    pub outbound_departure: String,
    pub outbound_arrival: String,
    pub return_departure: String,
    pub return_arrival: String,
    pub outbound_stops: String,
    pub return_stops: String,
    pub outbound_duration: String,
    pub return_duration: String,
    pub booking_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// False for placeholder records produced for an unsupported layout.
    #[serde(default = "default_supported")]
    pub supported: bool,
}

fn default_supported() -> bool {
    true
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.into()
}

impl FlightRecord {
    /// A record with every text field set to the sentinel.
    pub fn blank(rank: usize) -> Self {
        Self {
            rank,
            price: 0,
            airline: NOT_AVAILABLE.into(),
            outbound_departure: NOT_AVAILABLE.into(),
            outbound_arrival: NOT_AVAILABLE.into(),
            return_departure: NOT_AVAILABLE.into(),
            return_arrival: NOT_AVAILABLE.into(),
            outbound_stops: NOT_AVAILABLE.into(),
            return_stops: NOT_AVAILABLE.into(),
            outbound_duration: NOT_AVAILABLE.into(),
            return_duration: NOT_AVAILABLE.into(),
            booking_url: NOT_AVAILABLE.into(),
            currency: default_currency(),
            supported: true,
        }
    }

    pub fn placeholder(rank: usize) -> Self {
        Self {
            supported: false,
            ..Self::blank(rank)
        }
    }

    pub fn is_direct(&self) -> bool {
        let stops = self.outbound_stops.to_lowercase();
        stops.contains("direct") || stops.contains("nonstop") || stops == "0"
    }
}

impl std::fmt::Display for FlightRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {} {} | {} → {} ({}, {}) | {} → {} ({}, {})",
            self.rank,
            self.price,
            self.currency,
            self.airline,
            self.outbound_departure,
            self.outbound_arrival,
            self.outbound_stops,
            self.outbound_duration,
            self.return_departure,
            self.return_arrival,
            self.return_stops,
            self.return_duration,
        )?;
        if !self.supported {
            write!(f, " [unsupported layout]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_uses_sentinel_everywhere() {
        let r = FlightRecord::blank(3);
        assert_eq!(r.rank, 3);
        assert_eq!(r.price, 0);
        assert_eq!(r.airline, NOT_AVAILABLE);
        assert_eq!(r.return_duration, NOT_AVAILABLE);
        assert_eq!(r.booking_url, NOT_AVAILABLE);
        assert!(r.supported);
    }

    #[test]
    fn placeholder_is_flagged() {
        let r = FlightRecord::placeholder(1);
        assert!(!r.supported);
        assert!(r.to_string().contains("unsupported"));
    }

    #[test]
    fn direct_detection() {
        let mut r = FlightRecord::blank(1);
        r.outbound_stops = "Direct".into();
        assert!(r.is_direct());
        r.outbound_stops = "1 escale".into();
        assert!(!r.is_direct());
    }

    #[test]
    fn supported_defaults_to_true_when_missing() {
        let mut value = serde_json::to_value(FlightRecord::blank(1)).unwrap();
        value.as_object_mut().unwrap().remove("supported");
        value.as_object_mut().unwrap().remove("currency");
        let r: FlightRecord = serde_json::from_value(value).unwrap();
        assert!(r.supported);
        assert_eq!(r.currency, "EUR");
    }

    #[test]
    fn display_uses_record_currency() {
        let r = FlightRecord {
            price: 99,
            currency: "GBP".into(),
            ..FlightRecord::blank(1)
        };
        assert!(r.to_string().starts_with("#1 99 GBP "));
    }
}
