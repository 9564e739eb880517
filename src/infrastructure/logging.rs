//! Logging system configuration and initialization
//!
//! - Console output on stderr, keeping stdout free for the run summary
//! - Optional daily-rotated file output, plain or JSON
//! - `RUST_LOG` overrides the configured level and filters
//! - Chatty dependencies (browser protocol, HTTP, HTML parsing) are capped at
//!   `warn` unless the level is `trace`

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

/// Base name of the daily log files, `catalog-crawler.log.YYYY-MM-DD`
pub const LOG_FILE_PREFIX: &str = "catalog-crawler.log";

const NOISY_TARGETS: [&str; 7] = [
    "chromiumoxide",
    "tungstenite",
    "reqwest",
    "hyper",
    "hyper_util",
    "html5ever",
    "selectors",
];

// Keeps the non-blocking file writers alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with milliseconds
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the filter from `RUST_LOG`, falling back to the configured level
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    if !config.level.eq_ignore_ascii_case("trace") {
        for target in NOISY_TARGETS {
            filter = filter.add_directive(format!("{target}=warn").parse()?);
        }
    }
    for (module, level) in &config.module_filters {
        filter = filter.add_directive(
            format!("{module}={level}")
                .parse()
                .with_context(|| format!("Invalid filter {module}={level}"))?,
        );
    }

    Ok(filter)
}

fn file_layer(log_dir: &Path, json: bool) -> Result<BoxedLayer> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let (writer, guard) = non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow!("Log guard registry poisoned"))?
        .push(guard);

    let layer = fmt::Layer::new()
        .with_writer(writer)
        .with_timer(LocalTimeFormatter)
        .with_ansi(false);

    Ok(if json {
        layer
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        layer.with_target(true).boxed()
    })
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }
    if config.file_output {
        layers.push(file_layer(&config.log_dir, config.json_format)?);
    }
    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    let filter = build_filter(config)?;
    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .context("A global subscriber is already installed")?;

    info!(
        level = %config.level,
        console = config.console_output,
        file = config.file_output,
        json = config.json_format,
        "Logging system initialized"
    );
    if config.file_output {
        info!("Log directory: {}", config.log_dir.display());
    }

    Ok(())
}
