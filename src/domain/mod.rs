pub mod aggregator;
pub mod alerts;
pub mod flight;
pub mod layout;
pub mod month;
pub mod month_label;
pub mod run;
pub mod search;
