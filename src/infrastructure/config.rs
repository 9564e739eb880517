//! Configuration infrastructure
//!
//! Configuration is layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. TOML file (explicit path, else `<config_dir>/catalog-crawler/config.toml` if present)
//! 3. Environment variables, e.g. `CATALOG_CRAWLER__CRAWL__BATCH_SIZE=3` or
//!    `CATALOG_CRAWLER__CRAWL__CATEGORIES=laptopuri,televizoare`
//!
//! Loading does not validate: command-line flags are applied on top first,
//! then `AppConfig::validate` runs once and the value is passed explicitly to the
//! components that need it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::application::batch_scheduler::FailurePolicy;
use crate::domain::Category;
use crate::infrastructure::browser::ChromiumOptions;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::selectors::{INDEX_PLACEHOLDER, ListingSelectors};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "CATALOG_CRAWLER";

const DEFAULT_CATEGORIES: [&str; 4] =
    ["telefoane-mobile", "televizoare", "laptopuri", "smartwatch"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub browser: BrowserSettings,
    pub selectors: ListingSelectors,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// What to crawl and how the core paces itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Site root, e.g. `https://www.emag.ro`
    pub base_url: String,

    /// Categories in the order they are scheduled
    pub categories: Vec<Category>,

    /// Categories running concurrently per batch
    pub batch_size: usize,

    /// Slot-scan overshoot factor applied to the expected page size
    pub scan_tolerance: f64,

    /// Timeout of each per-slot DOM read
    pub slot_read_timeout_ms: u64,

    /// Timeout waiting for the pagination label
    pub label_timeout_ms: u64,

    /// Timeout of each page navigation
    pub navigation_timeout_ms: u64,

    /// Stop after this many pages per category (smoke runs)
    pub max_pages: Option<u32>,

    /// What to do after a batch in which a category failed
    pub failure_policy: FailurePolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.emag.ro".to_string(),
            categories: DEFAULT_CATEGORIES
                .iter()
                .filter_map(|c| Category::new(*c).ok())
                .collect(),
            batch_size: 5,
            scan_tolerance: 1.05,
            slot_read_timeout_ms: 50,
            label_timeout_ms: 10_000,
            navigation_timeout_ms: 30_000,
            max_pages: None,
            failure_policy: FailurePolicy::Continue,
        }
    }
}

impl CrawlConfig {
    pub const fn slot_read_timeout(&self) -> Duration {
        Duration::from_millis(self.slot_read_timeout_ms)
    }

    pub const fn label_timeout(&self) -> Duration {
        Duration::from_millis(self.label_timeout_ms)
    }

    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

/// Session engine backing the crawl
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Real browser rendering via Chromium
    Chromium,
    /// Server-rendered HTML fetched over HTTP
    Http,
    /// Saved HTML pages from a directory
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub engine: Engine,
    pub chromium: ChromiumOptions,
    pub http: HttpClientConfig,
    /// Root of saved pages for the snapshot engine
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            engine: Engine::Chromium,
            chromium: ChromiumOptions::default(),
            http: HttpClientConfig::default(),
            snapshot_dir: None,
        }
    }
}

/// Where per-category JSON documents are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("output"),
            pretty: true,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory of the daily log files
    pub log_dir: PathBuf,

    /// Module-specific log level filters (e.g., "chromiumoxide": "error")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            module_filters: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Default config file location, `<config_dir>/catalog-crawler/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("catalog-crawler").join("config.toml"))
    }

    /// Load defaults, file and process environment. Call [`AppConfig::validate`]
    /// once every override has been applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], reading overrides from `env` instead of the
    /// process environment when given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        match path {
            Some(path) => builder = builder.add_source(config::File::from(path)),
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("crawl.categories")
            .try_parsing(true)
            .source(env);
        builder = builder.add_source(environment);

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let crawl = &self.crawl;

        let base = Url::parse(&crawl.base_url).map_err(|e| {
            ConfigError::invalid(format!("base_url '{}' is not a URL: {e}", crawl.base_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("base_url must be http or https"));
        }

        if crawl.categories.is_empty() {
            return Err(ConfigError::invalid("at least one category is required"));
        }
        if crawl.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size must be greater than 0"));
        }
        if !crawl.scan_tolerance.is_finite() || crawl.scan_tolerance < 1.0 {
            return Err(ConfigError::invalid("scan_tolerance must be a finite value >= 1.0"));
        }

        for (name, value) in [
            ("slot_read_timeout_ms", crawl.slot_read_timeout_ms),
            ("label_timeout_ms", crawl.label_timeout_ms),
            ("navigation_timeout_ms", crawl.navigation_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(format!("{name} must be greater than 0")));
            }
        }
        if crawl.max_pages == Some(0) {
            return Err(ConfigError::invalid("max_pages must be greater than 0 when set"));
        }

        if !self.selectors.card.contains(INDEX_PLACEHOLDER) {
            return Err(ConfigError::invalid(format!(
                "selectors.card must contain the {INDEX_PLACEHOLDER} placeholder"
            )));
        }

        match self.browser.engine {
            Engine::Http if self.browser.http.max_requests_per_second == 0 => {
                return Err(ConfigError::invalid(
                    "http.max_requests_per_second must be greater than 0",
                ));
            }
            Engine::Snapshot if self.browser.snapshot_dir.is_none() => {
                return Err(ConfigError::invalid("the snapshot engine needs browser.snapshot_dir"));
            }
            _ => {}
        }

        Ok(())
    }
}
