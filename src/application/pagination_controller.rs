//! Walks every listing page of one category in order.
//!
//! Page 1 is loaded first and its footer label fixes the geometry of the whole
//! category. Each page is fully extracted before the next navigation.

use std::time::Duration;

use tracing::{debug, info};

use super::error::CrawlError;
use super::product_extractor::{ExtractionSettings, ProductExtractor};
use crate::domain::{Category, PaginationInfo, Product};
use crate::infrastructure::browser::BrowserSession;
use crate::infrastructure::config::AppConfig;

#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub base_url: String,
    pub label_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Walk at most this many pages
    pub max_pages: Option<u32>,
}

/// Everything collected for one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryHarvest {
    pub category: Category,
    pub products: Vec<Product>,
    pub pages_visited: u32,
    pub skipped_slots: u32,
    /// Geometry read from page 1
    pub pagination: PaginationInfo,
}

pub struct PaginationController {
    extractor: ProductExtractor,
    settings: PaginationSettings,
}

impl PaginationController {
    pub const fn new(extractor: ProductExtractor, settings: PaginationSettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let crawl = &config.crawl;
        Self::new(
            ProductExtractor::new(
                config.selectors.clone(),
                ExtractionSettings::from_config(crawl),
            ),
            PaginationSettings {
                base_url: crawl.base_url.clone(),
                label_timeout: crawl.label_timeout(),
                navigation_timeout: crawl.navigation_timeout(),
                max_pages: crawl.max_pages,
            },
        )
    }

    /// Collect every product of `category`, page after page
    pub async fn harvest(
        &self,
        session: &mut dyn BrowserSession,
        category: &Category,
    ) -> Result<CategoryHarvest, CrawlError> {
        let first_url = category.page_url(&self.settings.base_url, 1);
        self.navigate(session, &first_url).await?;

        let pagination = self.read_pagination(&*session, &first_url).await?;
        let page_count = pagination.page_count();
        let pages_to_visit = self
            .settings
            .max_pages
            .map_or(page_count, |cap| cap.min(page_count));

        info!(
            "📄 {}: {} products over {} pages of {} (walking {})",
            category,
            pagination.total_products,
            page_count,
            pagination.page_size(),
            pages_to_visit
        );

        let mut harvest = CategoryHarvest {
            category: category.clone(),
            products: Vec::new(),
            pages_visited: 0,
            skipped_slots: 0,
            pagination,
        };

        for page_index in 1..=pages_to_visit {
            // Page 1 is already on screen
            if page_index > 1 {
                let url = category.page_url(&self.settings.base_url, page_index);
                self.navigate(session, &url).await?;
            }

            let expected = pagination.expected_on_page(page_index);
            let page = self.extractor.extract(&*session, expected).await;
            debug!(
                category = %category,
                page = page_index,
                found = page.products.len(),
                expected,
                skipped = page.skipped,
                "Page extracted"
            );

            harvest.products.extend(page.products);
            harvest.skipped_slots += page.skipped;
            harvest.pages_visited += 1;
        }

        Ok(harvest)
    }

    async fn navigate(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<(), CrawlError> {
        let nav = session
            .navigate(url, self.settings.navigation_timeout)
            .await
            .map_err(|source| CrawlError::Navigation {
                url: url.to_string(),
                source,
            })?;
        debug!("Navigated to {} in {}ms", nav.final_url, nav.load_time_ms);
        Ok(())
    }

    async fn read_pagination(
        &self,
        session: &dyn BrowserSession,
        url: &str,
    ) -> Result<PaginationInfo, CrawlError> {
        let timeout = self.settings.label_timeout;
        let missing = |source| CrawlError::PaginationLabelMissing {
            url: url.to_string(),
            source,
        };

        let label = session
            .find(&self.extractor.selectors().pagination_label, None, timeout)
            .await
            .map_err(missing)?;
        let text = session.inner_text(label, timeout).await.map_err(missing)?;

        Ok(PaginationInfo::parse(&text)?)
    }
}
