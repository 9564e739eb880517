//! Infrastructure layer: browser engines, HTTP, configuration, logging and export

pub mod browser;
pub mod config;
pub mod export;
pub mod http_client;
pub mod logging;
pub mod selectors;

// Re-export commonly used items
pub use browser::{
    BrowserError, BrowserResult, BrowserSession, ChromiumOptions, ChromiumSessionFactory,
    ElementHandle, NavigationResult, SessionFactory, SnapshotPageSource, StaticHtmlSessionFactory,
};
pub use config::{AppConfig, ConfigError, CrawlConfig, Engine, LoggingConfig};
pub use export::{ExportError, JsonExporter};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{init_logging, init_logging_with_config};
pub use selectors::ListingSelectors;
