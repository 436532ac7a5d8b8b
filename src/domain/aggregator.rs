use chrono::{DateTime, Local, NaiveDate};
use tracing::warn;

use super::flight::FlightRecord;
use super::month::MonthPriceSummary;
use super::run::{RunEntries, RunMetadata, RunResult};

/// Item types a run can be made of.
pub trait RunItem: Sized {
    type Extra;
    fn into_entries(items: Vec<Self>, extra: Self::Extra) -> RunEntries;
}

impl RunItem for MonthPriceSummary {
    type Extra = ();

    fn into_entries(items: Vec<Self>, (): ()) -> RunEntries {
        RunEntries::Months {
            total_months: items.len(),
            months: items,
        }
    }
}

impl RunItem for FlightRecord {
    /// Depart and return dates of the searched round trip.
    type Extra = (NaiveDate, NaiveDate);

    fn into_entries(items: Vec<Self>, (depart_date, return_date): Self::Extra) -> RunEntries {
        RunEntries::Flights {
            depart_date,
            return_date,
            total_flights: items.len(),
            flights: items,
        }
    }
}

/// Ordered accumulation of one run's successful items.
#[derive(Debug)]
pub struct Aggregator<T> {
    origin: String,
    destination: String,
    scrape_date: DateTime<Local>,
    items: Vec<T>,
}

impl<T: RunItem> Aggregator<T> {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::started_at(origin, destination, Local::now())
    }

    pub fn started_at(
        origin: impl Into<String>,
        destination: impl Into<String>,
        scrape_date: DateTime<Local>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            scrape_date,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Seal the run. `None` when nothing was collected.
    pub fn finish(self, source: &str, extra: T::Extra) -> Option<RunResult> {
        if self.items.is_empty() {
            warn!(
                origin = %self.origin,
                destination = %self.destination,
                "Run produced no items, nothing to export"
            );
            return None;
        }
        Some(RunResult {
            scrape_date: self.scrape_date,
            origin: self.origin,
            destination: self.destination,
            entries: T::into_entries(self.items, extra),
            metadata: RunMetadata::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_keep_encounter_order() {
        let mut agg = Aggregator::new("Madrid", "Paris");
        for label in ["feb.", "mar.", "apr."] {
            agg.push(MonthPriceSummary::from_observations(label, &[100]));
        }
        let run = agg.finish("kayak.fr", ()).unwrap();
        let labels: Vec<&str> = run.months().iter().map(|m| m.month.as_str()).collect();
        assert_eq!(labels, ["feb.", "mar.", "apr."]);
        assert!(matches!(run.entries, RunEntries::Months { total_months: 3, .. }));
        assert_eq!(run.metadata.source, "kayak.fr");
    }

    #[test]
    fn duplicates_are_kept() {
        let mut agg = Aggregator::new("Madrid", "Paris");
        agg.push(MonthPriceSummary::unavailable("feb."));
        agg.push(MonthPriceSummary::unavailable("feb."));
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn empty_run_yields_none() {
        let agg: Aggregator<MonthPriceSummary> = Aggregator::new("Madrid", "Paris");
        assert!(agg.is_empty());
        assert!(agg.finish("kayak.fr", ()).is_none());
    }

    #[test]
    fn flights_carry_dates() {
        let depart = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let ret = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let mut agg = Aggregator::new("Madrid", "Paris");
        agg.push(FlightRecord::blank(1));
        agg.push(FlightRecord::blank(2));
        let run = agg.finish("kayak.fr", (depart, ret)).unwrap();
        match run.entries {
            RunEntries::Flights {
                depart_date,
                total_flights,
                ref flights,
                ..
            } => {
                assert_eq!(depart_date, depart);
                assert_eq!(total_flights, 2);
                assert_eq!(flights[1].rank, 2);
            }
            RunEntries::Months { .. } => panic!("expected flights"),
        }
    }
}
