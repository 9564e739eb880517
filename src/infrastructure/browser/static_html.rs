//! Static-HTML engine.
//!
//! Pages come from a `PageSource` (live HTTP or saved snapshots) and selectors
//! are evaluated with `scraper`. An element handle records the chain of
//! selectors that located it, each one applied below the previous match, so
//! scoped lookups behave like `element.querySelector(..)` in a browser.
//!
//! A page is parsed once per navigation. Sessions must be `Send`, which needs
//! scraper's `atomic` feature; the document sits behind a mutex because
//! `scraper::Html` is not `Sync`. Compiled selectors are cached for the life
//! of the session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{
    BrowserError, BrowserResult, BrowserSession, ElementHandle, NavigationResult, SessionFactory,
    bounded,
};
use crate::infrastructure::http_client::HttpClient;

/// Where the static engine gets page HTML from
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Return `(html, final_url)` for `url`
    async fn fetch(&self, url: &str) -> BrowserResult<(String, String)>;
}

/// Live pages over HTTP
pub struct HttpPageSource {
    client: Arc<HttpClient>,
}

impl HttpPageSource {
    pub const fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> BrowserResult<(String, String)> {
        self.client
            .get_text(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("{e:#}"),
            })
    }
}

/// Saved pages, keyed by URL path.
///
/// On disk `telefoane-mobile/p2/c` is served from `<root>/telefoane-mobile/p2/c.html`.
pub enum SnapshotPageSource {
    Directory(PathBuf),
    Memory(HashMap<String, String>),
}

impl SnapshotPageSource {
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self::Directory(root.into())
    }

    /// In-memory pages; keys are URL paths such as `televizoare/c`
    pub fn in_memory<K, V>(pages: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Memory(
            pages
                .into_iter()
                .map(|(k, v)| (snapshot_key(&k.into()), v.into()))
                .collect(),
        )
    }

    fn snapshot_path(root: &Path, key: &str) -> PathBuf {
        root.join(format!("{key}.html"))
    }
}

/// Normalize a URL or bare path into a snapshot key
fn snapshot_key(url_or_path: &str) -> String {
    let path = Url::parse(url_or_path)
        .map_or_else(|_| url_or_path.to_string(), |u| u.path().to_string());
    path.trim_matches('/').to_string()
}

#[async_trait]
impl PageSource for SnapshotPageSource {
    async fn fetch(&self, url: &str) -> BrowserResult<(String, String)> {
        let key = snapshot_key(url);
        let html = match self {
            Self::Memory(pages) => pages.get(&key).cloned().ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("no snapshot for '{key}'"),
            })?,
            Self::Directory(root) => {
                let path = Self::snapshot_path(root, &key);
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| BrowserError::Navigation {
                        url: url.to_string(),
                        reason: format!("cannot read snapshot {}: {e}", path.display()),
                    })?
            }
        };
        Ok((html, url.to_string()))
    }
}

/// Sessions over a shared `PageSource`
pub struct StaticHtmlSessionFactory {
    source: Arc<dyn PageSource>,
    name: &'static str,
}

impl StaticHtmlSessionFactory {
    pub fn http(client: Arc<HttpClient>) -> Self {
        Self {
            source: Arc::new(HttpPageSource::new(client)),
            name: "http",
        }
    }

    pub fn snapshots(source: SnapshotPageSource) -> Self {
        Self {
            source: Arc::new(source),
            name: "snapshot",
        }
    }
}

#[async_trait]
impl SessionFactory for StaticHtmlSessionFactory {
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        Ok(Box::new(StaticHtmlSession::new(Arc::clone(&self.source))))
    }

    fn engine_name(&self) -> &'static str {
        self.name
    }
}

/// One document at a time, plus the selector chains of located elements
pub struct StaticHtmlSession {
    source: Arc<dyn PageSource>,
    document: Mutex<Option<Html>>,
    selectors: Mutex<HashMap<String, Selector>>,
    handles: Mutex<Vec<Vec<String>>>,
}

impl StaticHtmlSession {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            document: Mutex::new(None),
            selectors: Mutex::new(HashMap::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    fn chain_of(&self, element: ElementHandle) -> BrowserResult<Vec<String>> {
        let handles = self
            .handles
            .lock()
            .map_err(|_| BrowserError::engine("handle table poisoned"))?;
        handles
            .get(element.index())
            .cloned()
            .ok_or(BrowserError::StaleHandle(element.index()))
    }

    fn register(&self, chain: Vec<String>) -> BrowserResult<ElementHandle> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| BrowserError::engine("handle table poisoned"))?;
        handles.push(chain);
        Ok(ElementHandle::new(handles.len() - 1))
    }

    /// Compiled selectors for `chain`, compiling the ones not seen yet
    fn compiled(&self, chain: &[String]) -> BrowserResult<Vec<Selector>> {
        let mut cache = self
            .selectors
            .lock()
            .map_err(|_| BrowserError::engine("selector cache poisoned"))?;
        chain
            .iter()
            .map(|selector| match cache.get(selector) {
                Some(compiled) => Ok(compiled.clone()),
                None => {
                    let compiled = compile(selector)?;
                    cache.insert(selector.clone(), compiled.clone());
                    Ok(compiled)
                }
            })
            .collect()
    }

    /// Run `f` on the element `chain` points at in the current document
    fn with_element<T>(
        &self,
        chain: &[String],
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> BrowserResult<T> {
        let document = self
            .document
            .lock()
            .map_err(|_| BrowserError::engine("document lock poisoned"))?;
        let document = document.as_ref().ok_or(BrowserError::NoDocument)?;
        let selectors = self.compiled(chain)?;
        let element = resolve_chain(document, chain, &selectors)?;
        Ok(f(element))
    }

    #[cfg(test)]
    fn cached_selectors(&self) -> usize {
        self.selectors.lock().map_or(0, |cache| cache.len())
    }
}

fn compile(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn resolve_chain<'a>(
    document: &'a Html,
    chain: &[String],
    selectors: &[Selector],
) -> BrowserResult<ElementRef<'a>> {
    let mut current: Option<ElementRef<'a>> = None;
    for (selector_str, selector) in chain.iter().zip(selectors) {
        let next = match current {
            None => document.select(selector).next(),
            Some(parent) => parent.select(selector).next(),
        };
        current = Some(next.ok_or_else(|| BrowserError::NotFound {
            selector: selector_str.clone(),
        })?);
    }
    current.ok_or_else(|| BrowserError::NotFound {
        selector: String::new(),
    })
}

/// Approximation of `innerText`: text nodes joined, whitespace runs collapsed
fn rendered_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl BrowserSession for StaticHtmlSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> BrowserResult<NavigationResult> {
        let start = Instant::now();
        let (html, final_url) = bounded(url, timeout, self.source.fetch(url)).await?;

        let parsed = Html::parse_document(&html);
        *self
            .document
            .lock()
            .map_err(|_| BrowserError::engine("document lock poisoned"))? = Some(parsed);
        self.handles
            .lock()
            .map_err(|_| BrowserError::engine("handle table poisoned"))?
            .clear();

        let load_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!("Loaded {} in {}ms", final_url, load_time_ms);
        Ok(NavigationResult {
            final_url,
            load_time_ms,
        })
    }

    async fn find(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
        _timeout: Duration,
    ) -> BrowserResult<ElementHandle> {
        let mut chain = match scope {
            Some(parent) => self.chain_of(parent)?,
            None => Vec::new(),
        };
        chain.push(selector.to_string());

        // A static document never changes, so there is nothing to wait for.
        self.with_element(&chain, |_| ())?;
        self.register(chain)
    }

    async fn inner_text(
        &self,
        element: ElementHandle,
        _timeout: Duration,
    ) -> BrowserResult<String> {
        let chain = self.chain_of(element)?;
        self.with_element(&chain, rendered_text)
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
        _timeout: Duration,
    ) -> BrowserResult<Option<String>> {
        let chain = self.chain_of(element)?;
        self.with_element(&chain, |el| el.value().attr(name).map(str::to_string))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        Ok(())
    }
}
