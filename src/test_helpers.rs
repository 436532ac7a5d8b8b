use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use scraper::{ElementRef, Html, Selector};

use crate::domain::flight::FlightRecord;
use crate::domain::month::MonthPriceSummary;
use crate::domain::run::{RunEntries, RunMetadata, RunResult};
use crate::error::{Result, ScraperError};
use crate::ports::browser::{BrowserPage, BrowserSession, ElementQuery, Locator};

/// What a scripted click does to the fake browser.
#[derive(Debug, Clone)]
pub enum Reaction {
    /// Replace the clicked page's DOM.
    SetHtml(String),
    /// Open a new tab showing this DOM.
    OpenTab(String),
}

struct Trigger {
    pattern: String,
    reaction: Reaction,
    once: bool,
}

#[derive(Default)]
struct PageState {
    html: String,
    url: String,
    actions: Vec<String>,
    failing: Vec<String>,
    triggers: Vec<Trigger>,
}

/// In-memory page whose DOM is a fixed HTML string, queried with `scraper`.
///
/// Waits never sleep: an element is either there or the wait times out.
pub struct FakePage {
    state: Mutex<PageState>,
    opened_tabs: Arc<Mutex<VecDeque<String>>>,
    closed_tabs: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(html: impl Into<String>) -> Self {
        Self::with_shared(html, Arc::default(), Arc::default())
    }

    fn with_shared(
        html: impl Into<String>,
        opened_tabs: Arc<Mutex<VecDeque<String>>>,
        closed_tabs: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            state: Mutex::new(PageState {
                html: html.into(),
                url: "about:blank".into(),
                ..PageState::default()
            }),
            opened_tabs,
            closed_tabs,
        }
    }

    pub fn set_html(&self, html: impl Into<String>) {
        self.state.lock().unwrap().html = html.into();
    }

    /// Every query whose CSS equals `css` fails.
    pub fn fail_on(&self, css: impl Into<String>) {
        self.state.lock().unwrap().failing.push(css.into());
    }

    /// React to every successful click on a locator whose display contains `pattern`.
    pub fn on_click(&self, pattern: impl Into<String>, reaction: Reaction) {
        self.push_trigger(pattern.into(), reaction, false);
    }

    pub fn on_click_once(&self, pattern: impl Into<String>, reaction: Reaction) {
        self.push_trigger(pattern.into(), reaction, true);
    }

    fn push_trigger(&self, pattern: String, reaction: Reaction, once: bool) {
        self.state.lock().unwrap().triggers.push(Trigger {
            pattern,
            reaction,
            once,
        });
    }

    /// Successful actions, in order, e.g. `click title="feb."`.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    fn record(&self, action: String) {
        self.state.lock().unwrap().actions.push(action);
    }

    fn count_matches(&self, locator: &Locator) -> Result<usize> {
        let state = self.state.lock().unwrap();
        let document = Html::parse_document(&state.html);
        let found = select(&document, &locator.query(), &state.failing)?;
        Ok(found.len())
    }

    fn first_text(&self, locator: &Locator) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        let document = Html::parse_document(&state.html);
        let found = select(&document, &locator.query(), &state.failing)?;
        Ok(found.first().map(|el| el.text().collect()))
    }

    fn require(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        if self.count_matches(locator)? > 0 {
            Ok(())
        } else {
            Err(ScraperError::Timeout {
                what: locator.to_string(),
                ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    fn fire_triggers(&self, locator: &Locator) {
        let display = locator.to_string();
        let mut state = self.state.lock().unwrap();
        let mut fired = Vec::new();
        state.triggers.retain(|t| {
            if display.contains(&t.pattern) {
                fired.push(t.reaction.clone());
                !t.once
            } else {
                true
            }
        });
        for reaction in fired {
            match reaction {
                Reaction::SetHtml(html) => state.html = html,
                Reaction::OpenTab(html) => self.opened_tabs.lock().unwrap().push_back(html),
            }
        }
    }
}

fn select<'a>(
    document: &'a Html,
    query: &ElementQuery,
    failing: &[String],
) -> Result<Vec<ElementRef<'a>>> {
    if failing.iter().any(|css| *css == query.css) {
        return Err(ScraperError::Extraction {
            reason: format!("scripted failure for {}", query.css),
        });
    }
    let selector = Selector::parse(&query.css).map_err(|e| ScraperError::Extraction {
        reason: format!("bad selector {}: {e}", query.css),
    })?;

    let candidates: Vec<ElementRef<'a>> = match &query.scope {
        None => document.select(&selector).collect(),
        Some(parent) => select(document, parent, failing)?
            .into_iter()
            .flat_map(|scope| scope.select(&selector).collect::<Vec<_>>())
            .collect(),
    };
    let mut kept: Vec<ElementRef<'a>> = candidates
        .into_iter()
        .filter(|el| {
            let text: String = el.text().collect();
            let label = el.value().attr("aria-label").or_else(|| el.value().attr("title"));
            query.filter.matches(&text, label)
        })
        .collect();

    Ok(match query.index {
        Some(n) if n < kept.len() => vec![kept.swap_remove(n)],
        Some(_) => Vec::new(),
        None => kept,
    })
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.state.lock().unwrap().url = url.to_string();
        self.record(format!("goto {url}"));
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.count_matches(locator)
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.require(locator, timeout)
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.require(locator, timeout)?;
        self.record(format!("click {locator}"));
        self.fire_triggers(locator);
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()> {
        self.require(locator, timeout)?;
        self.record(format!("fill {locator} {text}"));
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str, timeout: Duration) -> Result<()> {
        self.require(locator, timeout)?;
        self.record(format!("press {locator} {key}"));
        Ok(())
    }

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>> {
        self.first_text(locator)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().html.clone())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn title(&self) -> Result<String> {
        self.first_text(&Locator::css("title"))
            .map(Option::unwrap_or_default)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot {}", path.display()));
        Ok(())
    }

    async fn settle(&self, _delay: Duration) {}

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed_tabs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fake browser: one main page plus the tabs its clicks open.
pub struct FakeSession {
    main: FakePage,
    opened_tabs: Arc<Mutex<VecDeque<String>>>,
    closed_tabs: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new(html: impl Into<String>) -> Self {
        let opened_tabs = Arc::<Mutex<VecDeque<String>>>::default();
        let closed_tabs = Arc::<AtomicUsize>::default();
        Self {
            main: FakePage::with_shared(html, Arc::clone(&opened_tabs), Arc::clone(&closed_tabs)),
            opened_tabs,
            closed_tabs,
            closed: Arc::default(),
        }
    }

    pub fn main(&self) -> &FakePage {
        &self.main
    }

    pub fn tabs_closed(&self) -> usize {
        self.closed_tabs.load(Ordering::SeqCst)
    }

    /// Observe closing after the session has been moved away.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    fn page(&self) -> &dyn BrowserPage {
        &self.main
    }

    async fn wait_for_new_page(&self, timeout: Duration) -> Result<Box<dyn BrowserPage>> {
        let next = self.opened_tabs.lock().unwrap().pop_front();
        match next {
            Some(html) => Ok(Box::new(FakePage::with_shared(
                html,
                Arc::clone(&self.opened_tabs),
                Arc::clone(&self.closed_tabs),
            ))),
            None => Err(ScraperError::Timeout {
                what: "new tab".into(),
                ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    async fn close_stray_pages(&self) -> Result<usize> {
        let stray = self.opened_tabs.lock().unwrap().drain(..).count();
        self.closed_tabs.fetch_add(stray, Ordering::SeqCst);
        Ok(stray)
    }

    async fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn make_month(label: &str, average: u32, min: u32, max: u32) -> MonthPriceSummary {
    MonthPriceSummary {
        month: label.into(),
        average,
        min,
        max,
        count: 10,
        currency: "EUR".into(),
        available: true,
    }
}

pub fn make_month_run(months: Vec<MonthPriceSummary>) -> RunResult {
    RunResult {
        scrape_date: Local.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap(),
        origin: "Madrid".into(),
        destination: "Paris".into(),
        entries: RunEntries::Months {
            total_months: months.len(),
            months,
        },
        metadata: RunMetadata::new("kayak.fr"),
    }
}

pub fn make_flight(rank: usize, price: u32, airline: &str) -> FlightRecord {
    FlightRecord {
        price,
        airline: airline.into(),
        outbound_departure: "07:05".into(),
        outbound_arrival: "09:10".into(),
        outbound_stops: "direct".into(),
        ..FlightRecord::blank(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_page_evaluates_locators() {
        let page = FakePage::new(
            r#"<ul role="listbox"><li>A</li></ul><ul role="listbox"><li>B</li><li>C</li></ul>
               <a href="/x" aria-label="Voir les prix des vols">→</a>"#,
        );
        let second_list = Locator::css("ul[role='listbox']").nth(1).within("li");
        assert_eq!(page.count(&second_list).await.unwrap(), 2);
        assert_eq!(
            page.inner_text(&second_list.first()).await.unwrap().as_deref(),
            Some("B")
        );
        let link = Locator::role("link", "Voir les prix des vols");
        assert_eq!(page.count(&link).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_element_times_out() {
        let page = FakePage::new("<p></p>");
        let err = page
            .click(&Locator::title("feb."), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(page.actions().is_empty());
    }
}
