#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        if let Ok(summary) = kayak_fares::adapters::site::price_parser::parse_month_prices(
            html,
            "feb.",
            "div.f8F1-price-text",
        ) {
            assert!(summary.min <= summary.average && summary.average <= summary.max);
        }
        let _ = kayak_fares::adapters::site::card_parser::parse_price_text(html);
    }
});
