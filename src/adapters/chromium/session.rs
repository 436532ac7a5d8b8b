use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Element, Handler, Page};
use futures::StreamExt;
use futures::future::BoxFuture;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::chromium::endpoint::resolve_ws_endpoint;
use crate::config::types::BrowserConfig;
use crate::error::{Result, ScraperError};
use crate::ports::browser::{BrowserPage, BrowserSession, ElementQuery, Locator};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Run a CDP call under a timeout.
async fn bounded<T>(
    what: &str,
    timeout: Duration,
    fut: impl Future<Output = std::result::Result<T, CdpError>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ScraperError::Timeout {
            what: what.to_string(),
            ms: millis(timeout),
        }),
    }
}

/// A Chromium tab driven over CDP.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    fn matching<'a>(&'a self, query: &'a ElementQuery) -> BoxFuture<'a, Result<Vec<Element>>> {
        Box::pin(async move {
            let elements = match &query.scope {
                None => self.page.find_elements(query.css.as_str()).await?,
                Some(parent) => {
                    let mut found = Vec::new();
                    for scope in self.matching(parent).await? {
                        found.extend(scope.find_elements(query.css.as_str()).await?);
                    }
                    found
                }
            };
            let mut kept = if query.filter.needs_text() {
                let mut kept = Vec::with_capacity(elements.len());
                for element in elements {
                    let text = element.inner_text().await?.unwrap_or_default();
                    let label = match element.attribute("aria-label").await? {
                        Some(label) => Some(label),
                        None => element.attribute("title").await?,
                    };
                    if query.filter.matches(&text, label.as_deref()) {
                        kept.push(element);
                    }
                }
                kept
            } else {
                elements
            };

            Ok(match query.index {
                Some(n) if n < kept.len() => vec![kept.swap_remove(n)],
                Some(_) => Vec::new(),
                None => kept,
            })
        })
    }

    async fn wait_for_element(&self, locator: &Locator, timeout: Duration) -> Result<Element> {
        let query = locator.query();
        let poll = async {
            loop {
                if let Some(element) = self.matching(&query).await?.into_iter().next() {
                    return Ok::<_, ScraperError>(element);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(found) => found,
            Err(_) => Err(ScraperError::Timeout {
                what: locator.to_string(),
                ms: millis(timeout),
            }),
        }
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!(url, "Navigating");
        bounded(url, timeout, self.page.goto(url)).await?;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.matching(&locator.query()).await?.len())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.wait_for_element(locator, timeout).await.map(|_| ())
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let element = self.wait_for_element(locator, timeout).await?;
        bounded(&locator.to_string(), timeout, element.click()).await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()> {
        let what = locator.to_string();
        let element = self.wait_for_element(locator, timeout).await?;
        bounded(&what, timeout, element.click()).await?;
        bounded(
            &what,
            timeout,
            element.call_js_fn(
                "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
                false,
            ),
        )
        .await?;
        bounded(&what, timeout, element.type_str(text)).await?;
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str, timeout: Duration) -> Result<()> {
        let element = self.wait_for_element(locator, timeout).await?;
        bounded(&locator.to_string(), timeout, element.press_key(key)).await?;
        Ok(())
    }

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>> {
        match self.matching(&locator.query()).await?.into_iter().next() {
            Some(element) => Ok(element.inner_text().await?),
            None => Ok(None),
        }
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await?;
        debug!(path = %path.display(), "Saved screenshot");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}

/// A launched (or remotely connected) Chromium with one working tab.
pub struct ChromiumSession {
    browser: Browser,
    main: ChromiumPage,
    handler_task: JoinHandle<()>,
    known_targets: Mutex<HashSet<TargetId>>,
    launched: bool,
}

impl ChromiumSession {
    /// Launch a local browser, or connect to the configured remote one.
    pub async fn start(config: &BrowserConfig, http: &Client) -> Result<Self> {
        let (browser, handler, launched) = if config.remote {
            let endpoint = config.remote_endpoint.as_deref().ok_or_else(|| {
                ScraperError::Config("remote browser requested but no endpoint configured".into())
            })?;
            let ws = resolve_ws_endpoint(http, endpoint).await?;
            info!("Connecting to remote browser");
            let (browser, handler) = Browser::connect(ws).await?;
            (browser, handler, false)
        } else {
            let mut builder = chromiumoxide::BrowserConfig::builder().window_size(1366, 900);
            if !config.headless {
                builder = builder.with_head();
            }
            let cdp_config = builder.build().map_err(ScraperError::Config)?;
            info!(headless = config.headless, "Launching local browser");
            let (browser, handler) = Browser::launch(cdp_config).await?;
            (browser, handler, true)
        };

        let handler_task = spawn_handler_task(handler);
        let page = browser.new_page("about:blank").await?;
        let known_targets = browser
            .pages()
            .await?
            .iter()
            .map(|p| p.target_id().clone())
            .collect();

        Ok(Self {
            browser,
            main: ChromiumPage::new(page),
            handler_task,
            known_targets: Mutex::new(known_targets),
            launched,
        })
    }

    /// Remember a page; returns true when it had not been seen before.
    fn adopt(&self, page: &Page) -> bool {
        self.known_targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page.target_id().clone())
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    fn page(&self) -> &dyn BrowserPage {
        &self.main
    }

    async fn wait_for_new_page(&self, timeout: Duration) -> Result<Box<dyn BrowserPage>> {
        let poll = async {
            loop {
                let pages = self.browser.pages().await?;
                if let Some(page) = pages.into_iter().find(|p| self.adopt(p)) {
                    return Ok::<_, ScraperError>(page);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(page) => {
                let page = page?;
                debug!(target = ?page.target_id(), "New tab opened");
                Ok(Box::new(ChromiumPage::new(page)))
            }
            Err(_) => Err(ScraperError::Timeout {
                what: "new tab".into(),
                ms: millis(timeout),
            }),
        }
    }

    async fn close_stray_pages(&self) -> Result<usize> {
        let mut closed = 0;
        for page in self.browser.pages().await? {
            if !self.adopt(&page) {
                continue;
            }
            debug!(target = ?page.target_id(), "Closing stray tab");
            match page.close().await {
                Ok(()) => closed += 1,
                Err(e) => warn!(error = %e, "Could not close stray tab"),
            }
        }
        Ok(closed)
    }

    async fn close(mut self) -> Result<()> {
        let result = if self.launched {
            let closed = self.browser.close().await.map(|_| ()).map_err(ScraperError::from);
            if let Err(e) = self.browser.wait().await {
                warn!(error = %e, "Browser process did not exit cleanly");
            }
            closed
        } else {
            // Never shut down a hosted browser; only release our tab.
            self.main.page.clone().close().await.map_err(ScraperError::from)
        };
        self.handler_task.abort();
        info!("Browser closed");
        result
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!(error = %e, "CDP handler event error");
            }
        }
    })
}
