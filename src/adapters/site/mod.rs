pub mod card_parser;
pub mod detector;
pub mod driver;
pub mod price_parser;
