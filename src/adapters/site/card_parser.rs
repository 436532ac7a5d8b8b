use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, warn};
use url::Url;

use crate::domain::flight::{FlightRecord, NOT_AVAILABLE};
use crate::domain::layout::LayoutKind;
use crate::error::{Result, ScraperError};
use crate::ports::browser::{BrowserPage, normalize_text};

/// Digits (optionally grouped by plain, no-break or narrow no-break spaces)
/// followed by a currency marker.
static STRICT_PRICE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:[ \x{A0}\x{202F}]\d{3})*|\d+)\s*(€|EUR|\$|£)").ok()
});

/// Where each field of a flight card lives in one layout.
struct CardSelectors {
    card: &'static str,
    price: &'static str,
    airline: &'static str,
    /// One node per leg; the first is outbound, the second return.
    leg: &'static str,
    departure: &'static str,
    arrival: &'static str,
    stops: &'static str,
    duration: &'static str,
    booking_link: &'static str,
}

const LAYOUT_B: CardSelectors = CardSelectors {
    card: "div[data-resultid]",
    price: "div.f8F1-price-text",
    airline: "div.J0g6-operator-text",
    leg: "ol.hJSA-list > li",
    departure: "div.vmXl-mod-variant-large > span:first-child",
    arrival: "div.vmXl-mod-variant-large > span:last-child",
    stops: "span.JWEO-stops-text",
    duration: "div.xdW8 > div.vmXl-mod-variant-default",
    booking_link: "a.oVHK-fclink",
};

const LAYOUT_A: CardSelectors = CardSelectors {
    card: "div.resultWrapper",
    price: "span.price-text",
    airline: "div.codeshares-airline-names",
    leg: "ol.flights > li",
    departure: "span.depart-time",
    arrival: "span.arrival-time",
    stops: "span.stops-text",
    duration: "div.duration > div.top",
    booking_link: "a.booking-link",
};

struct Compiled {
    card: Selector,
    price: Selector,
    airline: Selector,
    leg: Selector,
    departure: Selector,
    arrival: Selector,
    stops: Selector,
    duration: Selector,
    booking_link: Selector,
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::Extraction {
        reason: format!("invalid card selector '{css}': {e}"),
    })
}

impl Compiled {
    fn new(s: &CardSelectors) -> Result<Self> {
        Ok(Self {
            card: compile(s.card)?,
            price: compile(s.price)?,
            airline: compile(s.airline)?,
            leg: compile(s.leg)?,
            departure: compile(s.departure)?,
            arrival: compile(s.arrival)?,
            stops: compile(s.stops)?,
            duration: compile(s.duration)?,
            booking_link: compile(s.booking_link)?,
        })
    }
}

/// Parse a displayed price such as `"1 234 €"` into whole currency units.
///
/// The strict grouped-digits-then-currency form is tried first, then every
/// digit in the text. Anything else is 0.
pub fn parse_price_text(raw: &str) -> u32 {
    let strict = STRICT_PRICE
        .as_ref()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    let digits: String = strict
        .unwrap_or(raw)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or_else(|_| {
        warn!(raw, "Price does not fit, using 0");
        0
    })
}

/// Extract up to `count` flight cards from a results page.
///
/// A card that fails is logged and skipped; ranks keep the on-page position.
/// For [`LayoutKind::Unrecognized`] `count` unsupported placeholders are
/// returned instead.
pub fn parse_cards(html: &str, layout: LayoutKind, count: usize, base_url: &str) -> Vec<FlightRecord> {
    match layout {
        LayoutKind::LayoutB => extract_with(&LAYOUT_B, layout, html, count, base_url),
        LayoutKind::LayoutA => extract_with(&LAYOUT_A, layout, html, count, base_url),
        LayoutKind::Unrecognized => {
            warn!(count, "No extraction rules for this layout, returning placeholders");
            (1..=count).map(FlightRecord::placeholder).collect()
        }
    }
}

/// Read the live page and extract its flight cards.
pub async fn extract_flights(
    page: &dyn BrowserPage,
    layout: LayoutKind,
    count: usize,
    base_url: &str,
) -> Result<Vec<FlightRecord>> {
    let html = page.content().await?;
    Ok(parse_cards(&html, layout, count, base_url))
}

fn extract_with(
    selectors: &CardSelectors,
    layout: LayoutKind,
    html: &str,
    count: usize,
    base_url: &str,
) -> Vec<FlightRecord> {
    let compiled = match Compiled::new(selectors) {
        Ok(c) => c,
        Err(e) => {
            error!(layout = %layout, error = %e, "Card selectors rejected");
            return Vec::new();
        }
    };
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut records = Vec::new();
    for (i, card) in document.select(&compiled.card).take(count).enumerate() {
        let rank = i + 1;
        match parse_card(card, &compiled, rank, base.as_ref()) {
            Ok(record) => {
                debug!(layout = %layout, rank, price = record.price, "Card extracted");
                records.push(record);
            }
            Err(e) => error!(layout = %layout, rank, error = %e, "Failed to extract flight card"),
        }
    }
    debug!(layout = %layout, extracted = records.len(), requested = count, "Cards parsed");
    records
}

fn parse_card(
    card: ElementRef<'_>,
    sel: &Compiled,
    rank: usize,
    base: Option<&Url>,
) -> Result<FlightRecord> {
    // Skeleton cards are rendered before their content arrives.
    if card.text().all(|t| t.trim().is_empty()) {
        return Err(ScraperError::Extraction {
            reason: format!("card {rank} has no content"),
        });
    }

    let mut record = FlightRecord::blank(rank);
    record.price = card
        .select(&sel.price)
        .next()
        .map(|node| parse_price_text(&node.text().collect::<String>()))
        .unwrap_or(0);
    record.airline = field(card, &sel.airline);

    let mut legs = card.select(&sel.leg);
    if let Some(leg) = legs.next() {
        record.outbound_departure = field(leg, &sel.departure);
        record.outbound_arrival = field(leg, &sel.arrival);
        record.outbound_stops = field(leg, &sel.stops);
        record.outbound_duration = field(leg, &sel.duration);
    }
    if let Some(leg) = legs.next() {
        record.return_departure = field(leg, &sel.departure);
        record.return_arrival = field(leg, &sel.arrival);
        record.return_stops = field(leg, &sel.stops);
        record.return_duration = field(leg, &sel.duration);
    }

    record.booking_url = card
        .select(&sel.booking_link)
        .find_map(|a| a.value().attr("href"))
        .and_then(|href| resolve(base, href))
        .unwrap_or_else(|| NOT_AVAILABLE.into());

    Ok(record)
}

/// Normalized text of the first match, or the sentinel.
fn field(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|node| normalize_text(&node.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.into())
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
    .map(String::from)
}
