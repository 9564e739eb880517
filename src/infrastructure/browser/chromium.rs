//! Chromium engine using chromiumoxide.
//!
//! Every session launches its own browser with a throwaway profile directory,
//! so concurrent categories never share cookies, tabs or a user-data lock.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{
    BrowserError, BrowserResult, BrowserSession, ElementHandle, NavigationResult, SessionFactory,
    bounded,
};

/// Poll interval while waiting for a selector to appear
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Launch options for the Chromium engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromiumOptions {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Browser binary; chromiumoxide's own lookup is used when unset
    pub executable: Option<PathBuf>,
    pub launch_timeout_ms: u64,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1278,
            viewport_height: 1287,
            executable: None,
            launch_timeout_ms: 30_000,
        }
    }
}

/// Launches one dedicated browser per session
pub struct ChromiumSessionFactory {
    options: ChromiumOptions,
}

impl ChromiumSessionFactory {
    pub const fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self, profile_dir: &std::path::Path) -> BrowserResult<BrowserConfig> {
        let opts = &self.options;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .window_size(opts.viewport_width, opts.viewport_height)
            .viewport(Viewport {
                width: opts.viewport_width,
                height: opts.viewport_height,
                ..Viewport::default()
            })
            .launch_timeout(Duration::from_millis(opts.launch_timeout_ms))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");

        if !opts.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &opts.executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| BrowserError::Engine(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        let profile_dir = tempfile::Builder::new()
            .prefix("catalog-crawler-profile-")
            .tempdir()
            .map_err(|e| BrowserError::Engine(format!("failed to create profile dir: {e}")))?;

        let config = self.browser_config(profile_dir.path())?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Engine(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Engine(format!("failed to create new page: {e}")));
            }
        };

        debug!("Chromium session opened (profile {})", profile_dir.path().display());
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            elements: Mutex::new(Vec::new()),
            _profile_dir: profile_dir,
        }))
    }

    fn engine_name(&self) -> &'static str {
        "chromium"
    }
}

/// A browser, its single tab, and the elements located on the current page
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    elements: Mutex<Vec<Arc<Element>>>,
    _profile_dir: TempDir,
}

impl ChromiumSession {
    fn element(&self, handle: ElementHandle) -> BrowserResult<Arc<Element>> {
        let elements = self
            .elements
            .lock()
            .map_err(|_| BrowserError::engine("element table poisoned"))?;
        elements
            .get(handle.index())
            .cloned()
            .ok_or(BrowserError::StaleHandle(handle.index()))
    }

    fn register(&self, element: Element) -> BrowserResult<ElementHandle> {
        let mut elements = self
            .elements
            .lock()
            .map_err(|_| BrowserError::engine("element table poisoned"))?;
        elements.push(Arc::new(element));
        Ok(ElementHandle::new(elements.len() - 1))
    }

    /// Poll until `selector` matches, like a browser-side wait-for-selector
    async fn wait_for(
        &self,
        selector: &str,
        scope: Option<Arc<Element>>,
        timeout: Duration,
    ) -> BrowserResult<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = match &scope {
                Some(parent) => parent.find_element(selector).await,
                None => self.page.find_element(selector).await,
            };
            match found {
                Ok(element) => return Ok(element),
                Err(_) if Instant::now() + POLL_INTERVAL < deadline => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(_) => {
                    return Err(BrowserError::NotFound {
                        selector: selector.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> BrowserResult<NavigationResult> {
        let start = Instant::now();
        let page = &self.page;

        bounded(url, timeout, async {
            page.goto(url).await.map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            page.wait_for_navigation()
                .await
                .map_err(|e| BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(())
        })
        .await?;

        self.elements
            .lock()
            .map_err(|_| BrowserError::engine("element table poisoned"))?
            .clear();

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn find(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
        timeout: Duration,
    ) -> BrowserResult<ElementHandle> {
        let scope = scope.map(|handle| self.element(handle)).transpose()?;
        let element = bounded(selector, timeout, self.wait_for(selector, scope, timeout)).await?;
        self.register(element)
    }

    async fn inner_text(&self, element: ElementHandle, timeout: Duration) -> BrowserResult<String> {
        let element = self.element(element)?;
        bounded("inner text", timeout, async {
            element
                .inner_text()
                .await
                .map(Option::unwrap_or_default)
                .map_err(BrowserError::engine)
        })
        .await
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
        timeout: Duration,
    ) -> BrowserResult<Option<String>> {
        let element = self.element(element)?;
        bounded(name, timeout, async {
            element.attribute(name).await.map_err(BrowserError::engine)
        })
        .await
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        let mut this = *self;
        if let Err(e) = this.page.clone().close().await {
            warn!("Failed to close page: {}", e);
        }
        let closed = this.browser.close().await.map_err(BrowserError::engine);
        if closed.is_ok() {
            let _ = this.browser.wait().await;
        }
        this.handler_task.abort();
        closed.map(|_| ())
    }
}
