//! Browser session capability and its WebDriver implementation.
//!
//! The orchestration core never talks to a driver library directly; it
//! depends on the [`BrowserSession`] / [`PageElement`] traits so the backend
//! can be swapped — a `fantoccini` WebDriver client in production, an
//! in-memory stub in tests.

use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use rand::{Rng, rng};
use serde_json::Value;
use std::error::Error;
use thiserror::Error as ThisError;
use tracing::{info, instrument};

/// WebDriver key code for Enter, sent to an input to submit its form when no
/// clickable submit element exists.
pub const ENTER_KEY: &str = "\u{E007}";

/// Errors surfaced by a browser session.
#[derive(Debug, ThisError)]
pub enum SessionError {
    /// A WebDriver command failed (navigation, lookup, script, ...).
    #[error("webdriver command failed: {0}")]
    Driver(#[from] CmdError),
    /// Backend-agnostic failure, used by non-driver implementations.
    #[error("{0}")]
    Other(String),
}

/// A handle to an element on the currently loaded page.
pub trait PageElement {
    async fn text(&self) -> Result<String, SessionError>;
    async fn is_displayed(&self) -> Result<bool, SessionError>;
    async fn click(&mut self) -> Result<(), SessionError>;
    async fn clear(&mut self) -> Result<(), SessionError>;
    async fn type_text(&mut self, keys: &str) -> Result<(), SessionError>;
}

/// One stateful browser session (cookies, login state, current page).
///
/// Lookups distinguish "not found" (`Ok(None)` / empty vec) from transport
/// failure (`Err`); callers in the extraction chain treat both as a missed
/// probe.
pub trait BrowserSession {
    type Element: PageElement;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;
    async fn page_source(&mut self) -> Result<String, SessionError>;
    async fn find(&mut self, css: &str) -> Result<Option<Self::Element>, SessionError>;
    async fn find_all(&mut self, css: &str) -> Result<Vec<Self::Element>, SessionError>;
    async fn run_script(&mut self, js: &str) -> Result<Value, SessionError>;
    /// Release the session. Called exactly once, from the run finalizer.
    async fn close(self) -> Result<(), SessionError>;
}

/// Production session backed by a running WebDriver (chromedriver).
pub struct WebDriverSession {
    client: Client,
}

/// Element handle backed by the WebDriver session.
pub struct DriverElement {
    inner: fantoccini::elements::Element,
}

impl WebDriverSession {
    /// Open a new session against a WebDriver endpoint.
    ///
    /// Capabilities carry the usual anti-detection arguments: automation
    /// switches stripped, `AutomationControlled` blink feature disabled, and
    /// a desktop Chrome user agent with a randomized major version.
    ///
    /// # Errors
    ///
    /// Fails when the endpoint is unreachable or refuses a session — fatal
    /// for the run, nothing has been fetched yet.
    #[instrument(level = "info", skip_all, fields(webdriver_url = %webdriver_url))]
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, Box<dyn Error>> {
        let chrome_major: u32 = rng().random_range(118..=128);
        let user_agent = format!(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/{chrome_major}.0.0.0 Safari/537.36"
        );
        let mut args = vec![
            "--start-maximized".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={user_agent}"),
        ];
        if headless {
            args.push("--headless=new".to_string());
        }

        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
            }),
        );

        let mut builder = ClientBuilder::rustls()?;
        builder.capabilities(caps);
        let client = builder.connect(webdriver_url).await?;
        info!(chrome_major, headless, "browser session created");
        Ok(WebDriverSession { client })
    }
}

impl BrowserSession for WebDriverSession {
    type Element = DriverElement;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        Ok(self.client.source().await?)
    }

    async fn find(&mut self, css: &str) -> Result<Option<Self::Element>, SessionError> {
        match self.client.find(Locator::Css(css)).await {
            Ok(el) => Ok(Some(DriverElement { inner: el })),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&mut self, css: &str) -> Result<Vec<Self::Element>, SessionError> {
        let elements = self.client.find_all(Locator::Css(css)).await?;
        Ok(elements
            .into_iter()
            .map(|inner| DriverElement { inner })
            .collect())
    }

    async fn run_script(&mut self, js: &str) -> Result<Value, SessionError> {
        Ok(self.client.execute(js, vec![]).await?)
    }

    async fn close(mut self) -> Result<(), SessionError> {
        self.client.close().await?;
        Ok(())
    }
}

impl PageElement for DriverElement {
    async fn text(&self) -> Result<String, SessionError> {
        Ok(self.inner.text().await?)
    }

    async fn is_displayed(&self) -> Result<bool, SessionError> {
        Ok(self.inner.is_displayed().await?)
    }

    async fn click(&mut self) -> Result<(), SessionError> {
        self.inner.click().await?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), SessionError> {
        self.inner.clear().await?;
        Ok(())
    }

    async fn type_text(&mut self, keys: &str) -> Result<(), SessionError> {
        self.inner.send_keys(keys).await?;
        Ok(())
    }
}
