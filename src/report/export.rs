use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::run::RunResult;
use crate::error::Result;

/// Pretty JSON, UTF-8 kept as is.
pub fn write_json(run: &RunResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(run)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "JSON exported");
    Ok(())
}

pub fn read_json(path: &Path) -> Result<RunResult> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Serialize)]
struct MonthRow<'a> {
    scrape_date: &'a str,
    origin: &'a str,
    destination: &'a str,
    month: &'a str,
    average_price: u32,
    min_price: u32,
    max_price: u32,
    flights_count: usize,
    currency: &'a str,
    available: bool,
}

#[derive(Serialize)]
struct FlightRow<'a> {
    rank: usize,
    price: u32,
    airline: &'a str,
    outbound_departure: &'a str,
    outbound_arrival: &'a str,
    return_departure: &'a str,
    return_arrival: &'a str,
    outbound_stops: &'a str,
    return_stops: &'a str,
    outbound_duration: &'a str,
    return_duration: &'a str,
    booking_url: &'a str,
}

/// One row per month, or one row per flight for a fixed-range run.
pub fn write_csv(run: &RunResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let scrape_date = run.scrape_date.to_rfc3339();

    if run.flights().is_empty() {
        for m in run.months() {
            writer.serialize(MonthRow {
                scrape_date: &scrape_date,
                origin: &run.origin,
                destination: &run.destination,
                month: &m.month,
                average_price: m.average,
                min_price: m.min,
                max_price: m.max,
                flights_count: m.count,
                currency: &m.currency,
                available: m.available,
            })?;
        }
    } else {
        for f in run.flights() {
            writer.serialize(FlightRow {
                rank: f.rank,
                price: f.price,
                airline: &f.airline,
                outbound_departure: &f.outbound_departure,
                outbound_arrival: &f.outbound_arrival,
                return_departure: &f.return_departure,
                return_arrival: &f.return_arrival,
                outbound_stops: &f.outbound_stops,
                return_stops: &f.return_stops,
                outbound_duration: &f.outbound_duration,
                return_duration: &f.return_duration,
                booking_url: &f.booking_url,
            })?;
        }
    }

    writer.flush()?;
    info!(path = %path.display(), rows = run.len(), "CSV exported");
    Ok(())
}
