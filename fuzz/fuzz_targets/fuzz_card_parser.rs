#![no_main]
use kayak_fares::domain::layout::LayoutKind;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        for layout in [LayoutKind::LayoutB, LayoutKind::LayoutA] {
            let cards = kayak_fares::adapters::site::card_parser::parse_cards(
                html,
                layout,
                5,
                "https://www.kayak.fr",
            );
            assert!(cards.len() <= 5);
        }
    }
});
