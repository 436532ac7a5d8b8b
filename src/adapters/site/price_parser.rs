use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::domain::month::MonthPriceSummary;
use crate::error::{Result, ScraperError};

/// Summarize every price tile of a month's price page.
///
/// Each node matching `selector` is reduced to its digits; nodes with nothing
/// numeric left (`"--"`, `"Prix inconnu"`) are skipped with a warning.
pub fn parse_month_prices(html: &str, month: &str, selector: &str) -> Result<MonthPriceSummary> {
    let selector = Selector::parse(selector).map_err(|e| ScraperError::Extraction {
        reason: format!("invalid price selector '{selector}': {e}"),
    })?;
    let document = Html::parse_document(html);

    let mut prices = Vec::new();
    for node in document.select(&selector) {
        let raw = node.text().collect::<String>();
        match digits_only(&raw) {
            Some(price) => {
                debug!(month, price, "Price found");
                prices.push(price);
            }
            None => warn!(month, raw = raw.trim(), "Price is not a number"),
        }
    }

    Ok(MonthPriceSummary::from_observations(month, &prices))
}

/// Digits of `raw` as a number; `None` when there are none or they overflow.
fn digits_only(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
