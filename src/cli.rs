//! Command-line interface components.

use std::path::PathBuf;

use clap::Parser;

use crate::application::{FailurePolicy, RunReport};
use crate::domain::Category;
use crate::infrastructure::config::{AppConfig, Engine};

#[derive(Parser, Debug, Default)]
#[command(name = "catalog-crawler")]
#[command(about = "Crawl product listing categories and export them as JSON")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Configuration file (TOML); defaults to <config dir>/catalog-crawler/config.toml
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Categories to crawl, comma separated (e.g. laptopuri,televizoare)
    #[arg(long, value_delimiter = ',', value_name = "CATEGORY")]
    pub categories: Vec<Category>,

    /// Categories crawled concurrently per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Output directory for the per-category JSON files
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Session engine
    #[arg(long, value_enum)]
    pub engine: Option<Engine>,

    /// Directory of saved listing pages; implies `--engine snapshot` when no engine is given
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Show the Chromium window
    #[arg(long)]
    pub headed: bool,

    /// Walk at most this many pages per category
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Stop scheduling new batches after the first failed category
    #[arg(long)]
    pub fail_fast: bool,
}

impl Args {
    /// Layer the flags that were given over `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if !self.categories.is_empty() {
            config.crawl.categories.clone_from(&self.categories);
        }
        if let Some(size) = self.batch_size {
            config.crawl.batch_size = size;
        }
        if let Some(dir) = &self.output {
            config.output.directory.clone_from(dir);
        }
        if let Some(dir) = &self.snapshot_dir {
            config.browser.snapshot_dir = Some(dir.clone());
            if self.engine.is_none() {
                config.browser.engine = Engine::Snapshot;
            }
        }
        if let Some(engine) = self.engine {
            config.browser.engine = engine;
        }
        if self.headed {
            config.browser.chromium.headless = false;
        }
        if self.max_pages.is_some() {
            config.crawl.max_pages = self.max_pages;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if self.fail_fast {
            config.crawl.failure_policy = FailurePolicy::Abort;
        }
    }
}

/// Per-category summary table plus run totals
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<28} {:>8} {:>8} {:>6} {:>9}  {}\n",
        "CATEGORY", "FOUND", "SKIPPED", "PAGES", "ELAPSED", "STATUS"
    ));
    out.push_str(&format!("{}\n", "-".repeat(72)));

    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(r) => out.push_str(&format!(
                "{:<28} {:>8} {:>8} {:>6} {:>8.1}s  ok\n",
                outcome.category.as_str(),
                r.products_found,
                r.skipped_slots,
                r.pages_visited,
                r.elapsed.as_secs_f64()
            )),
            Err(e) => out.push_str(&format!(
                "{:<28} {:>8} {:>8} {:>6} {:>9}  failed: {}\n",
                outcome.category.as_str(),
                "-",
                "-",
                "-",
                "-",
                e
            )),
        }
    }

    out.push_str(&format!("{}\n", "-".repeat(72)));
    out.push_str(&format!(
        "Run {}: {} products, {} failed categories, {:.1}s total{}\n",
        report.run_id,
        report.total_products(),
        report.failed_categories().len(),
        report.elapsed.as_secs_f64(),
        if report.aborted { " (aborted)" } else { "" }
    ));
    out
}
