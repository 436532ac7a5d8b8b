//! Standalone HTML report. Charts are inlined as base64 SVG data URIs so the
//! file can be mailed or archived on its own.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::chart::{best_deals_svg, escape_xml, price_trends_svg};
use crate::domain::alerts::get_best_month;
use crate::domain::month::currency_symbol;
use crate::domain::run::{RunEntries, RunResult};

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:2em;color:#2c3e50}\
h1{margin-bottom:0}.meta{color:gray;font-style:italic}\
.stats{display:flex;gap:1em;margin:1.5em 0}\
.stat{background:#ecf0f1;border-radius:6px;padding:1em;min-width:9em}\
.stat b{display:block;font-size:1.4em}\
.best{background:#eafaf1;border-left:6px solid #27ae60;padding:1em;margin:1em 0}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ddd;padding:6px 10px;text-align:left}\
th{background:#34495e;color:white}tr.unavailable{color:#aaa}\
img{max-width:100%;margin:1em 0}";

fn data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn stat(out: &mut String, label: &str, value: &str) {
    let _ = write!(
        out,
        r#"<div class="stat">{}<b>{}</b></div>"#,
        escape_xml(label),
        escape_xml(value)
    );
}

pub fn render_html(run: &RunResult) -> String {
    let route = escape_xml(&run.route());
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>Flight prices: {route}</title><style>{STYLE}</style></head><body>"#
    );
    let _ = write!(
        out,
        r#"<h1>Flight prices: {route}</h1><p class="meta">Scraped on {} from {} (v{})</p>"#,
        run.scrape_date.format("%Y-%m-%d %H:%M"),
        escape_xml(&run.metadata.source),
        escape_xml(&run.metadata.scraper_version)
    );

    match &run.entries {
        RunEntries::Months { .. } => month_sections(&mut out, run),
        RunEntries::Flights {
            depart_date,
            return_date,
            ..
        } => {
            let _ = write!(
                out,
                "<p>Outbound {depart_date}, return {return_date}</p>"
            );
            flight_sections(&mut out, run);
        }
    }

    out.push_str("</body></html>");
    out
}

fn month_sections(out: &mut String, run: &RunResult) {
    let symbol = currency_symbol(run.currency());
    let available: Vec<_> = run.available_months().collect();
    out.push_str(r#"<div class="stats">"#);
    stat(out, "Months scraped", &run.months().len().to_string());
    stat(out, "Months with flights", &available.len().to_string());
    if let Some(low) = available.iter().map(|m| m.min).filter(|&p| p > 0).min() {
        stat(out, "Lowest fare", &format!("{low} {symbol}"));
    }
    if let Some(high) = available.iter().map(|m| m.max).max() {
        stat(out, "Highest fare", &format!("{high} {symbol}"));
    }
    out.push_str("</div>");

    if let Some(best) = get_best_month(run) {
        let _ = write!(
            out,
            r#"<div class="best">Best month to fly: <b>{}</b>, average {} {} (range {} to {}, {} flights)</div>"#,
            escape_xml(&best.month),
            best.average_price,
            escape_xml(&best.currency),
            best.min_price,
            best.max_price,
            best.flights_count
        );
    }

    for svg in [price_trends_svg(run), best_deals_svg(run)].into_iter().flatten() {
        let _ = write!(out, r#"<img alt="chart" src="{}">"#, data_uri(&svg));
    }

    out.push_str(
        "<table><tr><th>Month</th><th>Average</th><th>Min</th><th>Max</th><th>Flights</th><th>Currency</th></tr>",
    );
    for m in run.months() {
        if m.available {
            let _ = write!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_xml(&m.month),
                m.average,
                m.min,
                m.max,
                m.count,
                escape_xml(&m.currency)
            );
        } else {
            let _ = write!(
                out,
                r#"<tr class="unavailable"><td>{}</td><td colspan="5">no flights found</td></tr>"#,
                escape_xml(&m.month)
            );
        }
    }
    out.push_str("</table>");
}

fn flight_sections(out: &mut String, run: &RunResult) {
    let flights = run.flights();
    let symbol = currency_symbol(run.currency());
    let priced: Vec<u32> = flights.iter().map(|f| f.price).filter(|&p| p > 0).collect();
    out.push_str(r#"<div class="stats">"#);
    stat(out, "Flights", &flights.len().to_string());
    if let Some(low) = priced.iter().min() {
        stat(out, "Cheapest", &format!("{low} {symbol}"));
    }
    if let Some(high) = priced.iter().max() {
        stat(out, "Dearest", &format!("{high} {symbol}"));
    }
    stat(
        out,
        "Direct",
        &flights.iter().filter(|f| f.is_direct()).count().to_string(),
    );
    out.push_str("</div>");

    if let Some(best) = flights.iter().filter(|f| f.price > 0).min_by_key(|f| f.price) {
        let _ = write!(
            out,
            r#"<div class="best">Best deal: <b>{} {}</b> with {} (#{})</div>"#,
            best.price,
            escape_xml(symbol),
            escape_xml(&best.airline),
            best.rank
        );
    }

    out.push_str(
        "<table><tr><th>#</th><th>Price</th><th>Airline</th><th>Outbound</th><th>Return</th><th>Stops</th><th>Duration</th><th>Link</th></tr>",
    );
    for f in flights {
        let link = if f.booking_url.starts_with("http") {
            format!(r#"<a href="{}">book</a>"#, escape_xml(&f.booking_url))
        } else {
            escape_xml(&f.booking_url)
        };
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} → {}</td><td>{} → {}</td><td>{} / {}</td><td>{} / {}</td><td>{link}</td></tr>",
            f.rank,
            f.price,
            escape_xml(&f.airline),
            escape_xml(&f.outbound_departure),
            escape_xml(&f.outbound_arrival),
            escape_xml(&f.return_departure),
            escape_xml(&f.return_arrival),
            escape_xml(&f.outbound_stops),
            escape_xml(&f.return_stops),
            escape_xml(&f.outbound_duration),
            escape_xml(&f.return_duration),
        );
    }
    out.push_str("</table>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::month::MonthPriceSummary;
    use crate::test_helpers::{make_flight, make_month, make_month_run};
    use chrono::NaiveDate;

    #[test]
    fn month_report_has_callout_table_and_charts() {
        let run = make_month_run(vec![
            make_month("feb.", 120, 89, 180),
            make_month("mar.", 98, 75, 145),
            MonthPriceSummary::unavailable("apr."),
        ]);
        let html = render_html(&run);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Best month to fly: <b>mar.</b>"));
        assert!(html.contains("Lowest fare<b>75 €</b>"));
        assert!(html.contains(r#"<tr class="unavailable"><td>apr.</td>"#));
        assert_eq!(html.matches("data:image/svg+xml;base64,").count(), 2);
    }

    #[test]
    fn text_is_escaped() {
        let mut run = make_month_run(vec![make_month("<b>feb.</b>", 120, 89, 180)]);
        run.destination = "Tom & Jerry".into();
        let html = render_html(&run);
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("&lt;b&gt;feb.&lt;/b&gt;"));
    }

    #[test]
    fn no_charts_without_available_months() {
        let run = make_month_run(vec![MonthPriceSummary::unavailable("feb.")]);
        let html = render_html(&run);
        assert!(!html.contains("data:image"));
        assert!(!html.contains("Best month"));
    }

    #[test]
    fn flight_report_lists_cards() {
        let mut cheap = make_flight(2, 150, "Vueling");
        cheap.booking_url = "https://www.kayak.fr/book/2?a=1&b=2".into();
        let run = RunResult {
            entries: RunEntries::Flights {
                depart_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                return_date: NaiveDate::from_ymd_opt(2026, 3, 17).unwrap(),
                total_flights: 2,
                flights: vec![make_flight(1, 210, "Iberia"), cheap],
            },
            ..make_month_run(Vec::new())
        };
        let html = render_html(&run);
        assert!(html.contains("Outbound 2026-03-10, return 2026-03-17"));
        assert!(html.contains("Best deal: <b>150 €</b> with Vueling (#2)"));
        assert!(html.contains(r#"href="https://www.kayak.fr/book/2?a=1&amp;b=2""#));
        assert!(html.contains("Direct<b>2</b>"));
    }

    #[test]
    fn prices_shown_in_run_currency() {
        let mut flight = make_flight(1, 180, "Vueling");
        flight.currency = "USD".into();
        let run = RunResult {
            entries: RunEntries::Flights {
                depart_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                return_date: NaiveDate::from_ymd_opt(2026, 3, 17).unwrap(),
                total_flights: 1,
                flights: vec![flight],
            },
            ..make_month_run(Vec::new())
        };
        let html = render_html(&run);
        assert!(html.contains("Cheapest<b>180 $</b>"));
        assert!(html.contains("Best deal: <b>180 $</b> with Vueling (#1)"));
        assert!(!html.contains('€'));
    }
}
