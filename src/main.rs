use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use catalog_crawler::cli::{Args, render_summary};
use catalog_crawler::infrastructure::config::AppConfig;
use catalog_crawler::infrastructure::logging::init_logging_with_config;
use catalog_crawler::run_crawl;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging_with_config(&config.logging)?;
    match &args.config {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("Loaded configuration from defaults, user file and environment"),
    }

    let report = run_crawl(&config, None).await?;
    print!("{}", render_summary(&report));

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        let failed: Vec<_> = report
            .failed_categories()
            .iter()
            .map(|c| c.as_str())
            .collect();
        error!("Run incomplete, failed categories: [{}]", failed.join(", "));
        Ok(ExitCode::FAILURE)
    }
}
