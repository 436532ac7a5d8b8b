use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Connect to a hosted browser instead of launching one locally.
    #[serde(default)]
    pub remote: bool,
    /// `ws://`/`wss://` CDP URL, or an `http(s)://` DevTools address to resolve.
    #[serde(default)]
    pub remote_endpoint: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            remote: false,
            remote_endpoint: None,
        }
    }
}

/// Per-step timeouts, all in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_ms")]
    pub default_ms: u64,
    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,
    #[serde(default = "default_short_wait_ms")]
    pub short_wait_ms: u64,
    #[serde(default = "default_month_select_ms")]
    pub month_select_ms: u64,
    #[serde(default = "default_flight_link_ms")]
    pub flight_link_ms: u64,
    #[serde(default = "default_new_page_ms")]
    pub new_page_ms: u64,
    #[serde(default = "default_price_load_ms")]
    pub price_load_ms: u64,
    #[serde(default = "default_search_settle_ms")]
    pub search_settle_ms: u64,
    #[serde(default = "default_results_ms")]
    pub results_ms: u64,
}

impl TimeoutConfig {
    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn short_wait(&self) -> Duration {
        Duration::from_millis(self.short_wait_ms)
    }

    pub fn month_select(&self) -> Duration {
        Duration::from_millis(self.month_select_ms)
    }

    pub fn flight_link(&self) -> Duration {
        Duration::from_millis(self.flight_link_ms)
    }

    pub fn new_page(&self) -> Duration {
        Duration::from_millis(self.new_page_ms)
    }

    pub fn price_load(&self) -> Duration {
        Duration::from_millis(self.price_load_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }

    pub fn results(&self) -> Duration {
        Duration::from_millis(self.results_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: default_timeout_ms(),
            page_load_ms: default_page_load_ms(),
            short_wait_ms: default_short_wait_ms(),
            month_select_ms: default_month_select_ms(),
            flight_link_ms: default_flight_link_ms(),
            new_page_ms: default_new_page_ms(),
            price_load_ms: default_price_load_ms(),
            search_settle_ms: default_search_settle_ms(),
            results_ms: default_results_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertConfig {
    /// Price threshold in currency units.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub debug_screenshots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            debug_screenshots: false,
        }
    }
}

/// Site-specific texts and selectors. The target front end changes often, so
/// everything the driver and extractors look for is overridable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_source_name")]
    pub source_name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub form: FormSelectors,
    #[serde(default)]
    pub months: MonthSelectors,
    #[serde(default)]
    pub calendar: CalendarSelectors,
    #[serde(default)]
    pub layouts: LayoutMarkers,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            source_name: default_source_name(),
            currency: default_currency(),
            form: FormSelectors::default(),
            months: MonthSelectors::default(),
            calendar: CalendarSelectors::default(),
            layouts: LayoutMarkers::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormSelectors {
    #[serde(default = "default_cookie_accept")]
    pub cookie_accept: String,
    #[serde(default = "default_search_type")]
    pub search_type: String,
    #[serde(default = "default_search_type_fallback")]
    pub search_type_fallback: String,
    #[serde(default = "default_origin_placeholder")]
    pub origin_placeholder: String,
    #[serde(default = "default_destination_placeholder")]
    pub destination_placeholder: String,
    #[serde(default = "default_suggestion_list")]
    pub suggestion_list: String,
    #[serde(default = "default_anywhere_text")]
    pub anywhere_text: String,
    /// Tried in order; the first click that succeeds wins.
    #[serde(default = "default_search_buttons")]
    pub search_buttons: Vec<String>,
    #[serde(default = "default_passengers_toggle")]
    pub passengers_toggle: String,
    #[serde(default = "default_adults_increment")]
    pub adults_increment: String,
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            cookie_accept: default_cookie_accept(),
            search_type: default_search_type(),
            search_type_fallback: default_search_type_fallback(),
            origin_placeholder: default_origin_placeholder(),
            destination_placeholder: default_destination_placeholder(),
            suggestion_list: default_suggestion_list(),
            anywhere_text: default_anywhere_text(),
            search_buttons: default_search_buttons(),
            passengers_toggle: default_passengers_toggle(),
            adults_increment: default_adults_increment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonthSelectors {
    #[serde(default = "default_departure_field")]
    pub departure_field: String,
    #[serde(default = "default_period_title")]
    pub period_title: String,
    #[serde(default = "default_flight_prices_link")]
    pub flight_prices_link: String,
    #[serde(default = "default_price_text")]
    pub price_text: String,
}

impl Default for MonthSelectors {
    fn default() -> Self {
        Self {
            departure_field: default_departure_field(),
            period_title: default_period_title(),
            flight_prices_link: default_flight_prices_link(),
            price_text: default_price_text(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalendarSelectors {
    #[serde(default = "default_date_field")]
    pub date_field: String,
    #[serde(default = "default_next_month")]
    pub next_month: String,
    #[serde(default = "default_day_button")]
    pub day_button: String,
}

impl Default for CalendarSelectors {
    fn default() -> Self {
        Self {
            date_field: default_date_field(),
            next_month: default_next_month(),
            day_button: default_day_button(),
        }
    }
}

/// Structural markers of the known result-page layouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutMarkers {
    #[serde(default = "default_layout_b_marker")]
    pub layout_b: String,
    #[serde(default = "default_layout_a_marker")]
    pub layout_a: String,
}

impl Default for LayoutMarkers {
    fn default() -> Self {
        Self {
            layout_b: default_layout_b_marker(),
            layout_a: default_layout_a_marker(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_page_load_ms() -> u64 {
    30_000
}

fn default_short_wait_ms() -> u64 {
    500
}

fn default_month_select_ms() -> u64 {
    2_000
}

fn default_flight_link_ms() -> u64 {
    3_000
}

fn default_new_page_ms() -> u64 {
    5_000
}

fn default_price_load_ms() -> u64 {
    5_000
}

fn default_search_settle_ms() -> u64 {
    1_000
}

fn default_results_ms() -> u64 {
    30_000
}

fn default_threshold() -> f64 {
    150.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_base_url() -> String {
    "https://www.kayak.fr".into()
}

fn default_source_name() -> String {
    "kayak.fr".into()
}

fn default_currency() -> String {
    "EUR".into()
}

fn default_cookie_accept() -> String {
    "button[class*='RxNS-button-content'], div[class*='dDYU-close']".into()
}

fn default_search_type() -> String {
    "[class*='neb-item-value']".into()
}

fn default_search_type_fallback() -> String {
    "div[class*='_6']".into()
}

fn default_origin_placeholder() -> String {
    "De ?".into()
}

fn default_destination_placeholder() -> String {
    "À ?".into()
}

fn default_suggestion_list() -> String {
    "ul[role='listbox']".into()
}

fn default_anywhere_text() -> String {
    "Monde entier".into()
}

fn default_search_buttons() -> Vec<String> {
    vec![
        "span._i5z button[aria-label='Lancer la recherche']".into(),
        "[title='Lancer la recherche']".into(),
        "button[type='submit']".into(),
    ]
}

fn default_passengers_toggle() -> String {
    "[class*='travelers'] [role='button'], div[class*='S9tW-title']".into()
}

fn default_adults_increment() -> String {
    "[aria-label='Augmenter le nombre d’adultes'], button[aria-label*='Augmenter'][aria-label*='adulte']".into()
}

fn default_departure_field() -> String {
    "[data-placeholder='Aller']".into()
}

fn default_period_title() -> String {
    "Période".into()
}

fn default_flight_prices_link() -> String {
    "Voir les prix des vols".into()
}

fn default_price_text() -> String {
    "div.f8F1-price-text".into()
}

fn default_date_field() -> String {
    "[aria-label='Date de départ'], div[class*='cQtq-input']".into()
}

fn default_next_month() -> String {
    "[aria-label='Mois suivant']".into()
}

fn default_day_button() -> String {
    "div[role='button'][class*='vn3g-button'], div[class*='mkUa-content']".into()
}

fn default_layout_b_marker() -> String {
    "div[data-resultid]".into()
}

fn default_layout_a_marker() -> String {
    "div.resultWrapper".into()
}
