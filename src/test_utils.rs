//! Test utilities for catalog-crawler
//!
//! A scripted, in-memory `BrowserSession` that understands the default
//! `ListingSelectors`. Pages are built from `FakeCard`s, where position `n` in
//! the list is grid slot `n + 1`. Open/close counts and navigations are
//! recorded so tests can check the session lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::infrastructure::browser::{
    BrowserError, BrowserResult, BrowserSession, ElementHandle, NavigationResult, SessionFactory,
    bounded,
};
use crate::infrastructure::selectors::ListingSelectors;

/// One grid slot
#[derive(Debug, Clone, Default)]
pub struct FakeCard {
    pub title: Option<String>,
    pub has_region: bool,
    pub url: Option<String>,
    pub old_price: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    /// Every read on this card takes this long
    pub delay: Option<Duration>,
}

impl FakeCard {
    pub fn product(title: &str, price: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            has_region: true,
            url: Some(format!("/{}/pd/X/", title.to_lowercase().replace(' ', "-"))),
            price: Some(price.to_string()),
            ..Self::default()
        }
    }

    /// A promotional tile: occupies a slot, carries no product data
    pub fn ad() -> Self {
        Self::default()
    }

    pub fn with_old_price(mut self, text: &str) -> Self {
        self.old_price = Some(text.to_string());
        self
    }

    pub fn with_stock(mut self, text: &str) -> Self {
        self.stock = Some(text.to_string());
        self
    }

    pub fn without_url(mut self) -> Self {
        self.url = None;
        self
    }

    pub const fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One listing page: footer label plus grid
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub label: Option<String>,
    pub cards: Vec<FakeCard>,
}

impl FakePage {
    pub fn new(label: Option<&str>, cards: Vec<FakeCard>) -> Self {
        Self {
            label: label.map(str::to_string),
            cards,
        }
    }

    /// `count` products named `{prefix} {n}`, priced `n,00 Lei`
    pub fn numbered(label: Option<&str>, prefix: &str, count: usize) -> Self {
        let cards = (1..=count)
            .map(|n| FakeCard::product(&format!("{prefix} {n}"), &format!("{n},00 Lei")))
            .collect();
        Self::new(label, cards)
    }
}

/// Lifecycle counters shared by a factory and all its sessions
#[derive(Debug, Default)]
pub struct SessionStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub navigations: Mutex<Vec<String>>,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Url,
    OldPrice,
    Price,
    Stock,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Label,
    Card(usize),
    Region(usize),
    Field(usize, Field),
}

/// Hands out `ScriptedSession`s over a fixed set of pages keyed by URL
pub struct ScriptedSessionFactory {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<SessionStats>,
    fail_open: bool,
}

impl ScriptedSessionFactory {
    pub fn new(pages: impl IntoIterator<Item = (String, FakePage)>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().collect()),
            stats: Arc::new(SessionStats::default()),
            fail_open: false,
        }
    }

    /// A factory whose sessions can never be opened
    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl SessionFactory for ScriptedSessionFactory {
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        if self.fail_open {
            return Err(BrowserError::engine("browser refused to start"));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            pages: Arc::clone(&self.pages),
            stats: Arc::clone(&self.stats),
            selectors: ListingSelectors::default(),
            current: None,
            nodes: Mutex::new(Vec::new()),
        }))
    }

    fn engine_name(&self) -> &'static str {
        "scripted"
    }
}

pub struct ScriptedSession {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<SessionStats>,
    selectors: ListingSelectors,
    current: Option<FakePage>,
    nodes: Mutex<Vec<Node>>,
}

impl ScriptedSession {
    /// A session already showing `page`
    pub fn showing(page: FakePage) -> Self {
        Self {
            pages: Arc::new(HashMap::new()),
            stats: Arc::new(SessionStats::default()),
            selectors: ListingSelectors::default(),
            current: Some(page),
            nodes: Mutex::new(Vec::new()),
        }
    }

    fn page(&self) -> BrowserResult<&FakePage> {
        self.current.as_ref().ok_or(BrowserError::NoDocument)
    }

    fn node(&self, handle: ElementHandle) -> BrowserResult<Node> {
        self.nodes
            .lock()
            .unwrap()
            .get(handle.index())
            .copied()
            .ok_or(BrowserError::StaleHandle(handle.index()))
    }

    fn register(&self, node: Node) -> ElementHandle {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.push(node);
        ElementHandle::new(nodes.len() - 1)
    }

    fn card(&self, slot: usize) -> BrowserResult<&FakeCard> {
        self.page()?
            .cards
            .get(slot - 1)
            .ok_or_else(|| BrowserError::NotFound {
                selector: format!("slot {slot}"),
            })
    }

    fn delay_of(&self, node: Node) -> Option<Duration> {
        let slot = match node {
            Node::Label => return None,
            Node::Card(slot) | Node::Region(slot) | Node::Field(slot, _) => slot,
        };
        self.card(slot).ok().and_then(|card| card.delay)
    }

    fn locate(&self, selector: &str, scope: Option<Node>) -> BrowserResult<Node> {
        let not_found = || BrowserError::NotFound {
            selector: selector.to_string(),
        };
        let s = &self.selectors;

        match scope {
            None if selector == s.pagination_label => {
                self.page()?.label.as_ref().ok_or_else(not_found)?;
                Ok(Node::Label)
            }
            None => {
                let slot = selector
                    .strip_prefix(".card-item:nth-child(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n >= 1)
                    .ok_or_else(not_found)?;
                self.card(slot)?;
                Ok(Node::Card(slot))
            }
            Some(Node::Card(slot)) if selector == s.link_region => {
                if self.card(slot)?.has_region {
                    Ok(Node::Region(slot))
                } else {
                    Err(not_found())
                }
            }
            Some(Node::Region(slot)) => {
                let card = self.card(slot)?;
                let (field, present) = if selector == s.product_url {
                    (Field::Url, card.url.is_some())
                } else if selector == s.old_price {
                    (Field::OldPrice, card.old_price.is_some())
                } else if selector == s.new_price {
                    (Field::Price, card.price.is_some())
                } else if selector == s.stock_status {
                    (Field::Stock, card.stock.is_some())
                } else {
                    return Err(not_found());
                };
                if present {
                    Ok(Node::Field(slot, field))
                } else {
                    Err(not_found())
                }
            }
            Some(_) => Err(not_found()),
        }
    }

    fn text_of(&self, node: Node) -> BrowserResult<String> {
        match node {
            Node::Label => Ok(self.page()?.label.clone().unwrap_or_default()),
            Node::Card(slot) => Ok(self.card(slot)?.title.clone().unwrap_or_default()),
            Node::Region(_) => Ok(String::new()),
            Node::Field(slot, field) => {
                let card = self.card(slot)?;
                let value = match field {
                    Field::Url => None,
                    Field::OldPrice => card.old_price.clone(),
                    Field::Price => card.price.clone(),
                    Field::Stock => card.stock.clone(),
                };
                Ok(value.unwrap_or_default())
            }
        }
    }

    fn attribute_of(&self, node: Node, name: &str) -> BrowserResult<Option<String>> {
        Ok(match node {
            Node::Card(slot) if name == self.selectors.title_attribute => {
                self.card(slot)?.title.clone()
            }
            Node::Field(slot, Field::Url) if name == self.selectors.url_attribute => {
                self.card(slot)?.url.clone()
            }
            _ => None,
        })
    }

    async fn after_delay<T>(
        &self,
        node: Node,
        timeout: Duration,
        read: impl FnOnce() -> BrowserResult<T> + Send,
    ) -> BrowserResult<T> {
        let delay = self.delay_of(node);
        bounded("scripted read", timeout, async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            read()
        })
        .await
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> BrowserResult<NavigationResult> {
        self.stats.navigations.lock().unwrap().push(url.to_string());
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                reason: "404".to_string(),
            })?;
        self.current = Some(page);
        self.nodes.lock().unwrap().clear();
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 0,
        })
    }

    async fn find(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
        timeout: Duration,
    ) -> BrowserResult<ElementHandle> {
        let scope = scope.map(|handle| self.node(handle)).transpose()?;
        let node = self.locate(selector, scope)?;
        self.after_delay(node, timeout, || Ok(())).await?;
        Ok(self.register(node))
    }

    async fn inner_text(&self, element: ElementHandle, timeout: Duration) -> BrowserResult<String> {
        let node = self.node(element)?;
        self.after_delay(node, timeout, || self.text_of(node)).await
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
        timeout: Duration,
    ) -> BrowserResult<Option<String>> {
        let node = self.node(element)?;
        self.after_delay(node, timeout, || self.attribute_of(node, name))
            .await
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
