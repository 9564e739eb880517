//! Product extraction from one rendered listing page.
//!
//! The grid is scanned by position. Some positions hold promotional tiles or
//! placeholders instead of products, so the scan may run past the expected
//! page size up to `ceil(tolerance * page_size)` slots. A slot whose required
//! reads fail is skipped and counted; it is never retried.

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use super::error::SkipReason;
use crate::domain::pagination::scan_limit;
use crate::domain::{Product, parse_old_price, parse_price, parse_stock_status};
use crate::infrastructure::browser::{BrowserSession, ElementHandle};
use crate::infrastructure::config::CrawlConfig;
use crate::infrastructure::selectors::ListingSelectors;

/// Default slot-scan overshoot
pub const DEFAULT_TOLERANCE: f64 = 1.05;

/// Default per-read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub tolerance: f64,
    pub read_timeout: Duration,
    /// Relative product links are resolved against this
    pub base_url: Option<Url>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            base_url: None,
        }
    }
}

impl ExtractionSettings {
    pub fn from_config(crawl: &CrawlConfig) -> Self {
        Self {
            tolerance: crawl.scan_tolerance,
            read_timeout: crawl.slot_read_timeout(),
            base_url: Url::parse(&crawl.base_url).ok(),
        }
    }
}

/// Products found on one page and what it cost to find them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageExtraction {
    pub products: Vec<Product>,
    /// Slots scanned without yielding a product
    pub skipped: u32,
    pub scanned_slots: u32,
}

#[derive(Debug, Clone)]
pub struct ProductExtractor {
    selectors: ListingSelectors,
    settings: ExtractionSettings,
}

impl ProductExtractor {
    pub const fn new(selectors: ListingSelectors, settings: ExtractionSettings) -> Self {
        Self {
            selectors,
            settings,
        }
    }

    pub const fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub const fn selectors(&self) -> &ListingSelectors {
        &self.selectors
    }

    /// Scan the page shown by `session` for up to `page_size` products.
    ///
    /// Never fails: unreadable slots only raise `skipped`.
    pub async fn extract(&self, session: &dyn BrowserSession, page_size: u32) -> PageExtraction {
        let limit = scan_limit(page_size, self.settings.tolerance);
        let mut page = PageExtraction::default();
        let mut collected = 0_u32;
        let mut slot = 1_u32;

        while collected < page_size && slot <= limit {
            page.scanned_slots += 1;
            match self.extract_slot(session, slot).await {
                Ok(product) => {
                    page.products.push(product);
                    collected += 1;
                }
                Err(reason) => {
                    page.skipped += 1;
                    debug!(slot, %reason, "Skipping slot");
                }
            }
            slot += 1;
        }

        if collected < page_size {
            warn!(
                "Collected {}/{} products after scanning {} slots ({} skipped)",
                collected, page_size, page.scanned_slots, page.skipped
            );
        }
        page
    }

    async fn extract_slot(
        &self,
        session: &dyn BrowserSession,
        slot: u32,
    ) -> Result<Product, SkipReason> {
        let s = &self.selectors;
        let timeout = self.settings.read_timeout;

        let card = session
            .find(&s.card_at(slot), None, timeout)
            .await
            .map_err(SkipReason::NoCard)?;

        let title = session
            .attribute(card, &s.title_attribute, timeout)
            .await
            .map_err(SkipReason::TitleUnreadable)?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SkipReason::EmptyTitle)?;

        let region = session
            .find(&s.link_region, Some(card), timeout)
            .await
            .map_err(SkipReason::NoLinkRegion)?;

        let url = self
            .optional_attribute(session, region, &s.product_url, &s.url_attribute)
            .await
            .map(|href| self.resolve_url(&href));

        let old_price_text = self.optional_text(session, region, &s.old_price).await;

        let price_element = session
            .find(&s.new_price, Some(region), timeout)
            .await
            .map_err(SkipReason::PriceUnreadable)?;
        let price_text = session
            .inner_text(price_element, timeout)
            .await
            .map_err(SkipReason::PriceUnreadable)?;
        let price = parse_price(&price_text)?;

        let stock_text = self.optional_text(session, region, &s.stock_status).await;

        Ok(Product {
            title,
            url,
            price,
            old_price: parse_old_price(old_price_text.as_deref()),
            stock_info: parse_stock_status(stock_text.as_deref()),
        })
    }

    async fn optional_text(
        &self,
        session: &dyn BrowserSession,
        scope: ElementHandle,
        selector: &str,
    ) -> Option<String> {
        let timeout = self.settings.read_timeout;
        let element = session.find(selector, Some(scope), timeout).await.ok()?;
        session.inner_text(element, timeout).await.ok()
    }

    async fn optional_attribute(
        &self,
        session: &dyn BrowserSession,
        scope: ElementHandle,
        selector: &str,
        name: &str,
    ) -> Option<String> {
        let timeout = self.settings.read_timeout;
        let element = session.find(selector, Some(scope), timeout).await.ok()?;
        session
            .attribute(element, name, timeout)
            .await
            .ok()
            .flatten()
            .filter(|v| !v.trim().is_empty())
    }

    fn resolve_url(&self, href: &str) -> String {
        let href = href.trim();
        self.settings
            .base_url
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map_or_else(|| href.to_string(), |url| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Availability;
    use crate::test_utils::{FakeCard, FakePage, ScriptedSession};

    fn extractor() -> ProductExtractor {
        ProductExtractor::new(
            ListingSelectors::default(),
            ExtractionSettings {
                base_url: Url::parse("https://www.emag.ro").ok(),
                ..ExtractionSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn reads_every_field_of_a_card() {
        let session = ScriptedSession::showing(FakePage::new(
            Some("1-1 din 1 de produse"),
            vec![
                FakeCard::product("Televizor Smart", "2.499,99 Lei")
                    .with_old_price("2.999,99 Lei")
                    .with_stock("Ultimele 2 produse"),
            ],
        ));

        let page = extractor().extract(&session, 1).await;
        assert_eq!(page.skipped, 0);
        assert_eq!(page.products.len(), 1);

        let product = &page.products[0];
        assert_eq!(product.title, "Televizor Smart");
        assert_eq!(
            product.url.as_deref(),
            Some("https://www.emag.ro/televizor-smart/pd/X/")
        );
        assert!((product.price - 2499.99).abs() < 1e-9);
        assert_eq!(product.old_price, Some(2999.99));
        let stock = product.stock_info.as_ref().unwrap();
        assert_eq!(stock.availability, Availability::Available);
        assert_eq!(stock.items_left_on_stock, Some(2));
    }

    #[tokio::test]
    async fn ads_inside_the_window_are_skipped_and_replaced() {
        // 40 products with two promotional tiles at slots 5 and 20
        let mut cards: Vec<FakeCard> = (1..=40)
            .map(|n| FakeCard::product(&format!("P{n}"), "10,00 Lei"))
            .collect();
        cards.insert(4, FakeCard::ad());
        cards.insert(19, FakeCard::ad());
        let session = ScriptedSession::showing(FakePage::new(None, cards));

        let page = extractor().extract(&session, 40).await;
        assert_eq!(page.products.len(), 40);
        assert_eq!(page.skipped, 2);
        assert_eq!(page.scanned_slots, 42);
        assert_eq!(page.products[39].title, "P40");
    }

    #[tokio::test]
    async fn scan_stops_at_the_tolerance_boundary() {
        // Three ads push the 40th product to slot 43, one past ceil(1.05 * 40)
        let mut cards: Vec<FakeCard> = (1..=40)
            .map(|n| FakeCard::product(&format!("P{n}"), "10,00 Lei"))
            .collect();
        for at in [0, 10, 20] {
            cards.insert(at, FakeCard::ad());
        }
        let session = ScriptedSession::showing(FakePage::new(None, cards));

        let page = extractor().extract(&session, 40).await;
        assert_eq!(page.scanned_slots, 42);
        assert_eq!(page.products.len(), 39);
        assert_eq!(page.skipped, 3);
    }

    #[tokio::test]
    async fn stops_once_the_page_is_full() {
        let session = ScriptedSession::showing(FakePage::numbered(None, "P", 45));
        let page = extractor().extract(&session, 40).await;
        assert_eq!(page.products.len(), 40);
        assert_eq!(page.scanned_slots, 40);
    }

    #[tokio::test]
    async fn optional_fields_may_be_absent() {
        let session = ScriptedSession::showing(FakePage::new(
            None,
            vec![
                FakeCard::product("Fara link", "99,90 Lei").without_url(),
                FakeCard::product("Stoc ciudat", "5,00 Lei").with_stock("Vine curand"),
            ],
        ));

        let page = extractor().extract(&session, 2).await;
        assert_eq!(page.products.len(), 2);
        assert_eq!(page.products[0].url, None);
        assert_eq!(page.products[0].old_price, None);
        assert_eq!(page.products[1].stock_info, None);
    }

    #[tokio::test]
    async fn unreadable_required_fields_skip_the_slot() {
        let mut no_price = FakeCard::product("Fara pret", "1,00 Lei");
        no_price.price = None;
        let mut bad_price = FakeCard::product("Pret stricat", "la cerere");
        bad_price.price = Some("la cerere".to_string());
        let mut empty_title = FakeCard::product("x", "1,00 Lei");
        empty_title.title = Some("   ".to_string());
        let mut no_region = FakeCard::product("Fara regiune", "1,00 Lei");
        no_region.has_region = false;

        let session = ScriptedSession::showing(FakePage::new(
            None,
            vec![no_price, bad_price, empty_title, no_region],
        ));

        let page = extractor().extract(&session, 4).await;
        assert!(page.products.is_empty());
        // ceil(1.05 * 4) = 5 slots scanned, the fifth has no card at all
        assert_eq!(page.skipped, 5);
    }

    #[tokio::test]
    async fn slow_reads_time_out_and_skip() {
        let session = ScriptedSession::showing(FakePage::new(
            None,
            vec![
                FakeCard::product("Lent", "1,00 Lei").slow(Duration::from_millis(200)),
                FakeCard::product("Rapid", "2,00 Lei"),
            ],
        ));

        let page = extractor().extract(&session, 1).await;
        assert_eq!(page.skipped, 1);
        assert_eq!(page.products[0].title, "Rapid");
    }

    #[tokio::test]
    async fn extraction_is_idempotent_on_an_unchanged_page() {
        let mut cards: Vec<FakeCard> = (1..=10)
            .map(|n| FakeCard::product(&format!("P{n}"), &format!("{n}9,99 Lei")))
            .collect();
        cards.insert(3, FakeCard::ad());
        let session = ScriptedSession::showing(FakePage::new(None, cards));
        let extractor = extractor();

        let first = extractor.extract(&session, 10).await;
        let second = extractor.extract(&session, 10).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_page_scans_nothing() {
        let session = ScriptedSession::showing(FakePage::default());
        let page = extractor().extract(&session, 0).await;
        assert_eq!(page, PageExtraction::default());
    }
}
