//! Application layer - crawl orchestration
//!
//! Drives browser sessions through the listing pages of each category and
//! schedules categories in batches. Talks to engines only through the
//! `SessionFactory` / `BrowserSession` traits.

pub mod batch_scheduler;
pub mod category_crawler;
pub mod error;
pub mod pagination_controller;
pub mod product_extractor;

// Re-export commonly used items
pub use batch_scheduler::{
    BatchReport, CategoryBatchScheduler, CategoryOutcome, CategoryReport, CategoryRunner,
    FailurePolicy, RunReport,
};
pub use category_crawler::CategoryCrawler;
pub use error::{CrawlError, SkipReason};
pub use pagination_controller::{CategoryHarvest, PaginationController, PaginationSettings};
pub use product_extractor::{ExtractionSettings, PageExtraction, ProductExtractor};
