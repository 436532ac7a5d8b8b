use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// How to find elements on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// Elements whose `title` attribute equals the text.
    Title(String),
    /// Inputs whose `placeholder` attribute equals the text.
    Placeholder(String),
    /// Elements with an ARIA role (explicit or implied by the tag) and accessible name.
    Role { role: String, name: String },
    /// Elements matching `css` whose trimmed visible text equals `text`.
    Text { css: String, text: String },
    /// Elements matching `css` that contain `text` anywhere in their visible text.
    HasText { css: String, text: String },
    /// Elements matching `css` inside any element the parent locator selects.
    Within { parent: Box<Locator>, css: String },
    /// The n-th (0-based) match of the inner locator.
    Nth(Box<Locator>, usize),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::Title(text.into())
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    pub fn text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            css: css.into(),
            text: text.into(),
        }
    }

    pub fn has_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::HasText {
            css: css.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn within(self, css: impl Into<String>) -> Self {
        Self::Within {
            parent: Box::new(self),
            css: css.into(),
        }
    }

    #[must_use]
    pub fn nth(self, n: usize) -> Self {
        match self {
            // Nth of Nth collapses onto the innermost list.
            Self::Nth(inner, _) => Self::Nth(inner, n),
            other => Self::Nth(Box::new(other), n),
        }
    }

    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Split into the base locator and the selected index, if any.
    pub fn split_nth(&self) -> (&Locator, Option<usize>) {
        match self {
            Self::Nth(inner, n) => (inner.as_ref(), Some(*n)),
            other => (other, None),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::Title(t) => write!(f, "title={t:?}"),
            Self::Placeholder(p) => write!(f, "placeholder={p:?}"),
            Self::Role { role, name } => write!(f, "role={role}[name={name:?}]"),
            Self::Text { css, text } => write!(f, "{css} >> text={text:?}"),
            Self::HasText { css, text } => write!(f, "{css} >> has-text={text:?}"),
            Self::Within { parent, css } => write!(f, "{parent} >> {css}"),
            Self::Nth(inner, n) => write!(f, "{inner} >> nth={n}"),
        }
    }
}

/// A locator lowered to a CSS query plus a visible-text filter, the form
/// every backend evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    pub css: String,
    pub filter: TextFilter,
    pub index: Option<usize>,
    /// Only search inside the elements this query selects.
    pub scope: Option<Box<ElementQuery>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFilter {
    Any,
    Exact(String),
    Contains(String),
    /// Matches `aria-label`, `title` or visible text, case-insensitively.
    AccessibleName(String),
}

impl TextFilter {
    pub fn needs_text(&self) -> bool {
        !matches!(self, Self::Any)
    }

    /// `label` is the element's `aria-label` or `title`, when present.
    pub fn matches(&self, text: &str, label: Option<&str>) -> bool {
        let text = normalize_text(text);
        match self {
            Self::Any => true,
            Self::Exact(expected) => text == normalize_text(expected),
            Self::Contains(needle) => text.contains(&normalize_text(needle)),
            Self::AccessibleName(name) => {
                let name = normalize_text(name).to_lowercase();
                label.is_some_and(|l| normalize_text(l).to_lowercase().contains(&name))
                    || text.to_lowercase().contains(&name)
            }
        }
    }
}

impl Locator {
    pub fn query(&self) -> ElementQuery {
        let (base, index) = self.split_nth();
        let mut scope = None;
        let (css, filter) = match base {
            Self::Css(css) => (css.clone(), TextFilter::Any),
            Self::Title(t) => (attr_selector("title", t), TextFilter::Any),
            Self::Placeholder(p) => (attr_selector("placeholder", p), TextFilter::Any),
            Self::Role { role, name } => {
                (role_selector(role), TextFilter::AccessibleName(name.clone()))
            }
            Self::Text { css, text } => (css.clone(), TextFilter::Exact(text.clone())),
            Self::HasText { css, text } => (css.clone(), TextFilter::Contains(text.clone())),
            Self::Within { parent, css } => {
                scope = Some(Box::new(parent.query()));
                (css.clone(), TextFilter::Any)
            }
            // split_nth already unwrapped the only Nth layer.
            Self::Nth(inner, _) => return inner.query(),
        };
        ElementQuery {
            css,
            filter,
            index,
            scope,
        }
    }
}

/// `[attr="value"]` with the value escaped for a double-quoted CSS string.
pub fn attr_selector(attr: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{attr}=\"{escaped}\"]")
}

/// CSS for elements carrying an ARIA role explicitly or through their tag.
pub fn role_selector(role: &str) -> String {
    match role {
        "link" => "a[href], [role='link']".into(),
        "button" => {
            "button, input[type='button'], input[type='submit'], [role='button']".into()
        }
        "textbox" => "input:not([type]), input[type='text'], textarea, [role='textbox']".into(),
        "option" => "option, [role='option']".into(),
        other => format!("[role='{other}']"),
    }
}

/// Collapse whitespace runs (including NBSP) to single spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The browser-automation capability the scraper consumes.
///
/// Element-level operations act on the first match unless the locator is
/// wrapped in [`Locator::Nth`]. Every waiting operation is bounded by the
/// given timeout.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Number of elements currently matching the locator.
    async fn count(&self, locator: &Locator) -> Result<usize>;

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Clear the field and type `text` into it.
    async fn fill(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()>;

    async fn press(&self, locator: &Locator, key: &str, timeout: Duration) -> Result<()>;

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>>;

    /// Serialized DOM of the whole page.
    async fn content(&self) -> Result<String>;

    async fn url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Fixed delay to absorb client-side rendering.
    async fn settle(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    async fn close(self: Box<Self>) -> Result<()>;
}

/// One browser context with a main page.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    fn page(&self) -> &dyn BrowserPage;

    /// Wait for a tab opened by the main page since the last call.
    async fn wait_for_new_page(&self, timeout: Duration) -> Result<Box<dyn BrowserPage>>;

    /// Close tabs that opened since the last call without being waited for.
    /// Returns how many were closed.
    async fn close_stray_pages(&self) -> Result<usize>;

    /// Release the browser. Called exactly once, on every exit path.
    async fn close(self) -> Result<()>;
}
