//! catalog-crawler - product listing crawler
//!
//! Walks the paginated listing of each configured category, extracts product
//! cards by grid position and writes one JSON document per category.
//! Categories run in fixed-size concurrent batches.

// Module declarations
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

pub use application::{CategoryBatchScheduler, CategoryCrawler, CrawlError, RunReport};
pub use domain::{Category, Product, SchedulerEvent};
pub use infrastructure::{AppConfig, Engine};

use infrastructure::browser::{
    ChromiumSessionFactory, SessionFactory, SnapshotPageSource, StaticHtmlSessionFactory,
};
use infrastructure::config::BrowserSettings;
use infrastructure::http_client::HttpClient;

/// Session factory for the configured engine
pub fn session_factory(settings: &BrowserSettings) -> Result<Arc<dyn SessionFactory>> {
    Ok(match settings.engine {
        Engine::Chromium => Arc::new(ChromiumSessionFactory::new(settings.chromium.clone())),
        Engine::Http => {
            let client = HttpClient::new(settings.http.clone())?;
            Arc::new(StaticHtmlSessionFactory::http(Arc::new(client)))
        }
        Engine::Snapshot => {
            let dir = settings
                .snapshot_dir
                .as_ref()
                .context("The snapshot engine needs a snapshot directory")?;
            Arc::new(StaticHtmlSessionFactory::snapshots(SnapshotPageSource::from_dir(dir)))
        }
    })
}

/// Crawl every configured category and return the run report.
///
/// Progress events go to `events` when given.
pub async fn run_crawl(
    config: &AppConfig,
    events: Option<UnboundedSender<SchedulerEvent>>,
) -> Result<RunReport> {
    config.validate()?;

    let factory = session_factory(&config.browser)?;
    info!("Using the {} engine against {}", factory.engine_name(), config.crawl.base_url);

    let crawler = CategoryCrawler::from_config(config, factory);
    let mut scheduler =
        CategoryBatchScheduler::new(config.crawl.batch_size, config.crawl.failure_policy);
    if let Some(sender) = events {
        scheduler = scheduler.with_events(sender);
    }

    Ok(scheduler.run(&config.crawl.categories, &crawler).await)
}
