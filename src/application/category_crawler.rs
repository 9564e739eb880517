//! One category's task: session scope, pagination walk, export.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::batch_scheduler::{CategoryReport, CategoryRunner};
use super::error::CrawlError;
use super::pagination_controller::{CategoryHarvest, PaginationController};
use crate::domain::Category;
use crate::infrastructure::browser::SessionFactory;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::export::JsonExporter;

pub struct CategoryCrawler {
    factory: Arc<dyn SessionFactory>,
    controller: PaginationController,
    exporter: Option<JsonExporter>,
}

impl CategoryCrawler {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        controller: PaginationController,
        exporter: Option<JsonExporter>,
    ) -> Self {
        Self {
            factory,
            controller,
            exporter,
        }
    }

    pub fn from_config(config: &AppConfig, factory: Arc<dyn SessionFactory>) -> Self {
        let exporter = config
            .output
            .enabled
            .then(|| JsonExporter::new(&config.output.directory, config.output.pretty));
        Self::new(factory, PaginationController::from_config(config), exporter)
    }

    /// Harvest `category` in a session of its own.
    ///
    /// The session is closed whether or not the harvest succeeds.
    pub async fn crawl(&self, category: &Category) -> Result<CategoryHarvest, CrawlError> {
        let mut session =
            self.factory
                .open_session()
                .await
                .map_err(|source| CrawlError::Session {
                    engine: self.factory.engine_name(),
                    source,
                })?;
        debug!("Opened {} session for {}", self.factory.engine_name(), category);

        let harvest = self.controller.harvest(session.as_mut(), category).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close session for {}: {}", category, e);
        }
        harvest
    }
}

#[async_trait]
impl CategoryRunner for CategoryCrawler {
    async fn run_category(&self, category: &Category) -> Result<CategoryReport, CrawlError> {
        let started = Instant::now();
        let harvest = self.crawl(category).await?;

        let output_path = match &self.exporter {
            Some(exporter) => Some(exporter.export(category, &harvest.products).await?),
            None => None,
        };

        Ok(CategoryReport {
            category: harvest.category,
            products_found: harvest.products.len(),
            pages_visited: harvest.pages_visited,
            skipped_slots: harvest.skipped_slots,
            elapsed: started.elapsed(),
            output_path,
        })
    }
}
