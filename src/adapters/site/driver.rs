use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::adapters::site::card_parser::extract_flights;
use crate::adapters::site::detector::detect_layout;
use crate::adapters::site::price_parser::parse_month_prices;
use crate::config::types::Config;
use crate::domain::aggregator::Aggregator;
use crate::domain::flight::FlightRecord;
use crate::domain::month::MonthPriceSummary;
use crate::domain::month_label::MonthLabel;
use crate::domain::run::{RunResult, file_stamp};
use crate::domain::search::{SearchMode, SearchRequest, month_delta};
use crate::error::{Result, ScraperError};
use crate::ports::browser::{BrowserPage, BrowserSession, Locator};

/// Where the search UI currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Init,
    FormReady,
    LocationsFilled,
    DatesSelected,
    PassengersConfigured,
    SearchSubmitted,
    ResultsLoaded,
    ItemOpened,
    ItemExtracted,
    BackToSearch,
    Done,
}

impl std::fmt::Display for NavState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::FormReady => "form_ready",
            Self::LocationsFilled => "locations_filled",
            Self::DatesSelected => "dates_selected",
            Self::PassengersConfigured => "passengers_configured",
            Self::SearchSubmitted => "search_submitted",
            Self::ResultsLoaded => "results_loaded",
            Self::ItemOpened => "item_opened",
            Self::ItemExtracted => "item_extracted",
            Self::BackToSearch => "back_to_search",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a step the run can do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped,
}

/// Drives the search form of the target site through one run.
pub struct SiteDriver<'a, S: BrowserSession> {
    config: &'a Config,
    session: &'a S,
    state: NavState,
    today: NaiveDate,
    steps: u32,
}

impl<'a, S: BrowserSession> SiteDriver<'a, S> {
    pub fn new(config: &'a Config, session: &'a S) -> Self {
        Self {
            config,
            session,
            state: NavState::Init,
            today: Local::now().date_naive(),
            steps: 0,
        }
    }

    /// Pin "today" instead of reading the clock.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    fn page(&self) -> &'a dyn BrowserPage {
        self.session.page()
    }

    /// Run whichever mode the request asks for. `Ok(None)` when nothing was collected.
    pub async fn run(&mut self, request: &SearchRequest) -> Result<Option<RunResult>> {
        match request.mode {
            SearchMode::MonthOffset { .. } => self.run_months(request).await,
            SearchMode::FixedRange { .. } => self.run_flights(request).await,
        }
    }

    /// One price summary per month, for the next `months` calendar months.
    pub async fn run_months(&mut self, request: &SearchRequest) -> Result<Option<RunResult>> {
        let SearchMode::MonthOffset { months } = request.mode else {
            return Err(ScraperError::InvalidRequest {
                reason: "month scrape needs a month-offset request".into(),
            });
        };
        request.validate(self.today)?;

        if let Err(e) = self.prepare_months(request).await {
            return Err(self.fatal(e).await);
        }

        let mut aggregator = Aggregator::new(&request.origin, &request.destination);
        for offset in 1..=months {
            let Some(label) = MonthLabel::offset_from(self.today, offset) else {
                warn!(offset, "Month offset out of calendar range");
                continue;
            };
            info!(month = %label, "Processing month {offset}/{months}");

            match self.scrape_month(&label).await {
                Ok(summary) => {
                    info!(month = %label, "{summary}");
                    aggregator.push(summary);
                }
                Err(e) if e.is_transient() => {
                    warn!(month = %label, error = %e, "Month skipped after timeout");
                }
                Err(e) => error!(month = %label, error = %e, "Month skipped"),
            }

            self.enter(NavState::BackToSearch).await;
            if let Err(e) = self.trigger_search().await {
                warn!(error = %e, "Could not return to search");
            }
        }

        self.enter(NavState::Done).await;
        info!(collected = aggregator.len(), "Month scrape finished");
        Ok(aggregator.finish(&self.config.site.source_name, ()))
    }

    /// The top flight cards for one fixed round trip.
    pub async fn run_flights(&mut self, request: &SearchRequest) -> Result<Option<RunResult>> {
        let SearchMode::FixedRange {
            depart,
            return_date,
            top,
        } = request.mode
        else {
            return Err(ScraperError::InvalidRequest {
                reason: "flight scrape needs a fixed-range request".into(),
            });
        };
        request.validate(self.today)?;

        if let Err(e) = self.prepare_flights(request, depart, return_date).await {
            return Err(self.fatal(e).await);
        }

        let page = self.page();
        let markers = &self.config.site.layouts;
        let results = Locator::css(format!("{}, {}", markers.layout_b, markers.layout_a));
        if let Err(e) = page.wait_for(&results, self.config.timeouts.results()).await {
            warn!(error = %e, "No known result layout appeared");
        }
        page.settle(self.config.timeouts.search_settle()).await;

        let layout = detect_layout(page, markers).await;
        self.enter(NavState::ResultsLoaded).await;
        info!(layout = %layout, top, "Extracting flights");

        let flights = extract_flights(page, layout, top, &self.config.site.base_url).await?;
        let mut aggregator: Aggregator<FlightRecord> =
            Aggregator::new(&request.origin, &request.destination);
        for mut flight in flights {
            flight.currency.clone_from(&self.config.site.currency);
            debug!(rank = flight.rank, "{flight}");
            aggregator.push(flight);
        }

        self.enter(NavState::Done).await;
        info!(collected = aggregator.len(), "Flight scrape finished");
        Ok(aggregator.finish(&self.config.site.source_name, (depart, return_date)))
    }

    async fn prepare_months(&mut self, request: &SearchRequest) -> Result<()> {
        self.open_form().await?;
        self.fill_locations(request).await?;
        self.configure_passengers(request.adults).await?;
        self.trigger_search().await?;
        self.enter(NavState::SearchSubmitted).await;
        Ok(())
    }

    async fn prepare_flights(
        &mut self,
        request: &SearchRequest,
        depart: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<()> {
        self.open_form().await?;
        self.fill_locations(request).await?;
        self.select_dates(depart, return_date).await?;
        self.configure_passengers(request.adults).await?;
        self.trigger_search().await?;
        self.enter(NavState::SearchSubmitted).await;
        Ok(())
    }

    /// Load the site and open the search form.
    async fn open_form(&mut self) -> Result<()> {
        let page = self.page();
        let config = self.config;
        let timeouts = &config.timeouts;
        let form = &config.site.form;

        info!(url = %config.site.base_url, "Navigating");
        page.goto(&config.site.base_url, timeouts.page_load())
            .await
            .map_err(|e| navigation(NavState::Init, &e))?;
        self.dismiss_cookie_banner().await;

        let primary = Locator::css(&form.search_type);
        if let Err(e) = page.click(&primary, timeouts.default_wait()).await {
            warn!(error = %e, "Search type selector failed, trying fallback");
            let fallback = Locator::css(&form.search_type_fallback).first();
            page.click(&fallback, timeouts.default_wait())
                .await
                .map_err(|e| navigation(NavState::FormReady, &e))?;
        }
        self.enter(NavState::FormReady).await;
        Ok(())
    }

    /// Close the consent banner when one shows up.
    pub async fn dismiss_cookie_banner(&self) -> StepOutcome {
        let banner = Locator::css(&self.config.site.form.cookie_accept).first();
        match self
            .page()
            .click(&banner, self.config.timeouts.short_wait())
            .await
        {
            Ok(()) => {
                debug!("Cookie banner dismissed");
                StepOutcome::Done
            }
            Err(e) => {
                debug!(error = %e, "No cookie banner");
                StepOutcome::Skipped
            }
        }
    }

    async fn fill_locations(&mut self, request: &SearchRequest) -> Result<()> {
        let page = self.page();
        let config = self.config;
        let timeouts = &config.timeouts;
        let form = &config.site.form;

        page.fill(
            &Locator::placeholder(&form.origin_placeholder),
            &request.origin,
            timeouts.default_wait(),
        )
        .await?;
        page.settle(timeouts.short_wait()).await;
        let origin_choice = Locator::css(&form.suggestion_list).within("li").first();
        page.click(&origin_choice, timeouts.default_wait()).await?;

        // The destination picker may open on a region list first.
        let anywhere = Locator::has_text("div", &form.anywhere_text).first();
        if let Err(e) = page.click(&anywhere, timeouts.short_wait()).await {
            debug!(error = %e, "No region selector");
        }

        page.fill(
            &Locator::placeholder(&form.destination_placeholder),
            &request.destination,
            timeouts.default_wait(),
        )
        .await?;
        page.settle(timeouts.short_wait()).await;
        let destination_choice = Locator::css(&form.suggestion_list)
            .nth(1)
            .within("li")
            .first();
        page.click(&destination_choice, timeouts.default_wait()).await?;
        page.settle(timeouts.short_wait()).await;

        self.enter(NavState::LocationsFilled).await;
        Ok(())
    }

    /// Click the first search button that responds.
    async fn trigger_search(&self) -> Result<()> {
        let page = self.page();
        let timeouts = &self.config.timeouts;
        for css in &self.config.site.form.search_buttons {
            let button = Locator::css(css).first();
            match page.click(&button, timeouts.default_wait()).await {
                Ok(()) => {
                    debug!(button = %button, "Search triggered");
                    page.settle(timeouts.search_settle()).await;
                    return Ok(());
                }
                Err(e) => debug!(button = %button, error = %e, "Search button failed"),
            }
        }
        Err(ScraperError::ElementNotFound {
            locator: "search button".into(),
        })
    }

    async fn scrape_month(&mut self, label: &MonthLabel) -> Result<MonthPriceSummary> {
        let page = self.page();
        let config = self.config;
        let timeouts = &config.timeouts;
        let months = &config.site.months;

        let departure = Locator::css(&months.departure_field);
        page.wait_for(&departure, timeouts.month_select()).await?;
        page.click(&departure, timeouts.default_wait()).await?;
        page.click(&Locator::title(&months.period_title), timeouts.default_wait())
            .await?;
        page.settle(timeouts.short_wait()).await;
        self.click_month_label(label).await?;
        self.enter(NavState::DatesSelected).await;

        let link = Locator::role("link", &months.flight_prices_link);
        page.wait_for(&link, timeouts.flight_link()).await?;
        // A tab from an earlier month that opened too late must not be read as this one.
        match self.session.close_stray_pages().await {
            Ok(0) => {}
            Ok(n) => warn!(month = %label, closed = n, "Closed tabs left over from a previous month"),
            Err(e) => debug!(month = %label, error = %e, "Could not check for leftover tabs"),
        }
        page.click(&link, timeouts.default_wait()).await?;
        let tab = self.session.wait_for_new_page(timeouts.new_page()).await?;
        self.enter(NavState::ItemOpened).await;

        let summary = self.read_month_tab(tab.as_ref(), label).await;
        if let Err(e) = tab.close().await {
            warn!(month = %label, error = %e, "Could not close price tab");
        }
        let summary = summary?;
        self.enter(NavState::ItemExtracted).await;
        Ok(summary)
    }

    async fn read_month_tab(&self, tab: &dyn BrowserPage, label: &MonthLabel) -> Result<MonthPriceSummary> {
        let selector = &self.config.site.months.price_text;
        tab.wait_for(&Locator::css(selector), self.config.timeouts.price_load())
            .await?;
        let html = tab.content().await?;
        let mut summary = parse_month_prices(&html, &label.primary, selector)?;
        summary.currency.clone_from(&self.config.site.currency);
        Ok(summary)
    }

    /// Try each spelling of the month until one tile responds.
    async fn click_month_label(&self, label: &MonthLabel) -> Result<()> {
        let page = self.page();
        let timeout = self.config.timeouts.month_select();
        for candidate in label.candidates() {
            let tile = Locator::title(&candidate);
            let clicked = match page.wait_for(&tile, timeout).await {
                Ok(()) => page.click(&tile, timeout).await,
                Err(e) => Err(e),
            };
            match clicked {
                Ok(()) => {
                    debug!(month = %label, label = %candidate, "Month selected");
                    return Ok(());
                }
                Err(e) => debug!(month = %label, label = %candidate, error = %e, "Month label not found"),
            }
        }
        Err(ScraperError::ElementNotFound {
            locator: format!("month tile for {label}"),
        })
    }

    async fn select_dates(&mut self, depart: NaiveDate, return_date: NaiveDate) -> Result<()> {
        let page = self.page();
        let config = self.config;
        let timeouts = &config.timeouts;
        let calendar = &config.site.calendar;

        page.click(&Locator::css(&calendar.date_field).first(), timeouts.default_wait())
            .await?;
        self.advance_calendar(month_delta(self.today, depart)).await?;

        let depart_day = Locator::text(&calendar.day_button, depart.day().to_string()).first();
        page.click(&depart_day, timeouts.default_wait()).await?;

        // Two months are shown side by side; later months need paging first.
        let return_offset = month_delta(depart, return_date);
        if return_offset > 1 {
            self.advance_calendar(return_offset - 1).await?;
        }
        let index = usize::from(return_offset > 0);
        let return_day =
            Locator::text(&calendar.day_button, return_date.day().to_string()).nth(index);
        page.click(&return_day, timeouts.default_wait()).await?;

        debug!(%depart, %return_date, "Dates selected");
        self.enter(NavState::DatesSelected).await;
        Ok(())
    }

    async fn advance_calendar(&self, months: u32) -> Result<()> {
        let page = self.page();
        let next = Locator::css(&self.config.site.calendar.next_month).first();
        for _ in 0..months {
            page.click(&next, self.config.timeouts.default_wait()).await?;
            page.settle(self.config.timeouts.short_wait()).await;
        }
        Ok(())
    }

    async fn configure_passengers(&mut self, adults: u32) -> Result<()> {
        if adults > 1 {
            let page = self.page();
            let timeouts = &self.config.timeouts;
            let form = &self.config.site.form;
            let toggle = Locator::css(&form.passengers_toggle).first();
            page.click(&toggle, timeouts.default_wait()).await?;
            let increment = Locator::css(&form.adults_increment).first();
            for _ in 1..adults {
                page.click(&increment, timeouts.default_wait()).await?;
            }
            if let Err(e) = page.press(&toggle, "Escape", timeouts.short_wait()).await {
                debug!(error = %e, "Passenger popover left open");
            }
            page.settle(timeouts.short_wait()).await;
        }
        debug!(adults, "Passengers configured");
        self.enter(NavState::PassengersConfigured).await;
        Ok(())
    }

    async fn enter(&mut self, next: NavState) {
        debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
        self.steps += 1;
        if self.config.output.debug_screenshots {
            let name = format!("debug_{:02}_{next}_{}.png", self.steps, file_stamp(&Local::now()));
            if let Err(e) = self.screenshot(&name).await {
                debug!(error = %e, "Debug screenshot failed");
            }
        }
    }

    /// Capture the page after a fatal failure, then hand the error back.
    async fn fatal(&self, e: ScraperError) -> ScraperError {
        error!(state = %self.state, error = %e, "Cannot reach the search form");
        let name = format!("error_{}.png", file_stamp(&Local::now()));
        match self.screenshot(&name).await {
            Ok(path) => info!(path = %path.display(), "Error screenshot saved"),
            Err(shot) => warn!(error = %shot, "Error screenshot failed"),
        }
        match e {
            ScraperError::Navigation { .. } | ScraperError::Browser(_) => e,
            other => navigation(self.state, &other),
        }
    }

    async fn screenshot(&self, name: &str) -> Result<PathBuf> {
        let dir = &self.config.output.dir;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        self.page().screenshot(&path).await?;
        Ok(path)
    }
}

fn navigation(state: NavState, e: &ScraperError) -> ScraperError {
    ScraperError::Navigation {
        state: state.to_string(),
        reason: e.to_string(),
    }
}

/// Run one request on `session` and close the session whatever happens.
pub async fn run_with_session<S: BrowserSession>(
    session: S,
    config: &Config,
    request: &SearchRequest,
) -> Result<Option<RunResult>> {
    let result = SiteDriver::new(config, &session).run(request).await;
    match session.close().await {
        Ok(()) => debug!("Session closed"),
        Err(e) => warn!(error = %e, "Session did not close cleanly"),
    }
    result
}
