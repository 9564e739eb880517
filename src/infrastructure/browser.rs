//! Browser session abstraction.
//!
//! Defines the `SessionFactory` and `BrowserSession` traits the crawler core
//! talks to. Two engines implement them: Chromium via chromiumoxide, and a
//! static-HTML engine that evaluates selectors with `scraper` on documents
//! fetched over HTTP or replayed from snapshots.

pub mod chromium;
pub mod static_html;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chromium::{ChromiumOptions, ChromiumSessionFactory};
pub use static_html::{HttpPageSource, PageSource, SnapshotPageSource, StaticHtmlSessionFactory};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("No element matches '{selector}'")]
    NotFound { selector: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Element handle {0} is no longer valid")]
    StaleHandle(usize),

    #[error("No page has been loaded yet")]
    NoDocument,

    #[error("Browser engine error: {0}")]
    Engine(String),
}

impl BrowserError {
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn engine(err: impl std::fmt::Display) -> Self {
        Self::Engine(err.to_string())
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Opaque reference to an element located in the session's current page.
///
/// Handles are invalidated by the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(usize);

impl ElementHandle {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// One exclusive browsing context.
///
/// `navigate` takes `&mut self`: a session shows one page at a time and reads
/// can never overlap a navigation.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` and wait until navigation completes
    async fn navigate(&mut self, url: &str, timeout: Duration) -> BrowserResult<NavigationResult>;

    /// Wait up to `timeout` for the first element matching `selector`,
    /// searching the whole page or only below `scope`
    async fn find(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
        timeout: Duration,
    ) -> BrowserResult<ElementHandle>;

    /// Rendered text content of the element
    async fn inner_text(&self, element: ElementHandle, timeout: Duration) -> BrowserResult<String>;

    /// Attribute value, `None` when the element has no such attribute
    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
        timeout: Duration,
    ) -> BrowserResult<Option<String>>;

    /// Release the session and everything it holds
    async fn close(self: Box<Self>) -> BrowserResult<()>;
}

/// Hands out exclusive sessions, one per category task
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>>;

    /// Engine name for diagnostics
    fn engine_name(&self) -> &'static str;
}

/// Run `fut` under a hard deadline, mapping expiry to `BrowserError::Timeout`
pub async fn bounded<T, F>(what: &str, timeout: Duration, fut: F) -> BrowserResult<T>
where
    F: std::future::Future<Output = BrowserResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or_else(|_| Err(BrowserError::timeout(what, timeout)))
}
