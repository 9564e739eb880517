//! Fixed-size batch scheduling of categories.
//!
//! Categories are split into consecutive batches. All categories of a batch
//! run concurrently, polled together on the calling task, and the next batch
//! starts only once every one of them has settled. A failing category never
//! cancels its siblings; the `FailurePolicy` decides whether later batches
//! still run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::CrawlError;
use crate::domain::{Category, SchedulerEvent};

/// What happens after a batch in which at least one category failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failures and run the remaining batches
    #[default]
    Continue,
    /// Start no further batches
    Abort,
}

/// One category's complete run, as seen by the scheduler
#[async_trait]
pub trait CategoryRunner: Send + Sync {
    async fn run_category(&self, category: &Category) -> Result<CategoryReport, CrawlError>;
}

/// Summary of a successful category run
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    pub category: Category,
    pub products_found: usize,
    pub pages_visited: u32,
    pub skipped_slots: u32,
    pub elapsed: Duration,
    /// Exported document, when export is enabled
    pub output_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct CategoryOutcome {
    pub category: Category,
    pub result: Result<CategoryReport, CrawlError>,
}

impl CategoryOutcome {
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct BatchReport {
    /// 0-based batch position
    pub index: usize,
    /// In the batch's category order
    pub outcomes: Vec<CategoryOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub batches: Vec<BatchReport>,
    pub elapsed: Duration,
    /// Batches were left unstarted because of `FailurePolicy::Abort`
    pub aborted: bool,
}

impl RunReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &CategoryOutcome> {
        self.batches.iter().flat_map(|b| b.outcomes.iter())
    }

    pub fn total_products(&self) -> usize {
        self.outcomes()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.products_found)
            .sum()
    }

    pub fn failed_categories(&self) -> Vec<&Category> {
        self.outcomes()
            .filter(|o| !o.is_success())
            .map(|o| &o.category)
            .collect()
    }

    /// Every scheduled category ran and succeeded
    pub fn is_success(&self) -> bool {
        !self.aborted && self.outcomes().all(CategoryOutcome::is_success)
    }
}

pub struct CategoryBatchScheduler {
    batch_size: usize,
    failure_policy: FailurePolicy,
    events: Option<UnboundedSender<SchedulerEvent>>,
}

impl CategoryBatchScheduler {
    /// `batch_size` below 1 is treated as 1
    pub fn new(batch_size: usize, failure_policy: FailurePolicy) -> Self {
        Self {
            batch_size: batch_size.max(1),
            failure_policy,
            events: None,
        }
    }

    /// Publish progress events on `sender`
    #[must_use]
    pub fn with_events(mut self, sender: UnboundedSender<SchedulerEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Consecutive, order-preserving batches of at most `batch_size`
    pub fn partition<'a>(&self, categories: &'a [Category]) -> Vec<&'a [Category]> {
        categories.chunks(self.batch_size).collect()
    }

    fn emit(&self, event: SchedulerEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver only means nobody is listening any more
            let _ = sender.send(event);
        }
    }

    /// Run every category through `runner`, batch after batch
    pub async fn run(&self, categories: &[Category], runner: &dyn CategoryRunner) -> RunReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let batches = self.partition(categories);
        let total_batches = batches.len();

        info!(
            %run_id,
            "🚀 Crawling {} categories in {} batches of up to {}",
            categories.len(),
            total_batches,
            self.batch_size
        );

        let mut reports = Vec::with_capacity(total_batches);
        let mut aborted = false;

        for (index, batch) in batches.into_iter().enumerate() {
            let report = self.run_batch(index, total_batches, batch, runner).await;
            let failed = report.failed();
            reports.push(report);

            if failed > 0
                && self.failure_policy == FailurePolicy::Abort
                && index + 1 < total_batches
            {
                warn!(
                    "🛑 Batch {}/{} had {} failed categories, skipping {} remaining batches",
                    index + 1,
                    total_batches,
                    failed,
                    total_batches - index - 1
                );
                aborted = true;
                break;
            }
        }

        let report = RunReport {
            run_id,
            batches: reports,
            elapsed: started.elapsed(),
            aborted,
        };
        info!(
            %run_id,
            "🏁 Run finished: {} products, {} failed categories in {:.1}s",
            report.total_products(),
            report.failed_categories().len(),
            report.elapsed.as_secs_f64()
        );
        report
    }

    async fn run_batch(
        &self,
        index: usize,
        total_batches: usize,
        batch: &[Category],
        runner: &dyn CategoryRunner,
    ) -> BatchReport {
        let started = Instant::now();
        info!(
            "📦 Batch {}/{}: {}",
            index + 1,
            total_batches,
            batch.iter().map(Category::as_str).collect::<Vec<_>>().join(", ")
        );
        self.emit(SchedulerEvent::BatchStarted {
            index,
            total_batches,
            categories: batch.to_vec(),
            timestamp: Utc::now(),
        });

        let tasks = batch.iter().map(|category| async move {
            let result = runner.run_category(category).await;
            match &result {
                Ok(report) => info!(
                    "✅ {}: {} products, {} pages, {} skipped slots in {:.1}s",
                    category,
                    report.products_found,
                    report.pages_visited,
                    report.skipped_slots,
                    report.elapsed.as_secs_f64()
                ),
                Err(e) => error!(kind = e.kind(), "❌ {}: {}", category, e),
            }
            self.emit(SchedulerEvent::CategoryFinished {
                batch_index: index,
                category: category.clone(),
                products_found: result.as_ref().ok().map(|r| r.products_found),
                error: result.as_ref().err().map(ToString::to_string),
                timestamp: Utc::now(),
            });
            CategoryOutcome {
                category: category.clone(),
                result,
            }
        });
        let outcomes = join_all(tasks).await;

        let report = BatchReport {
            index,
            outcomes,
            elapsed: started.elapsed(),
        };
        self.emit(SchedulerEvent::BatchCompleted {
            index,
            succeeded: report.succeeded(),
            failed: report.failed(),
            elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            timestamp: Utc::now(),
        });
        report
    }
}
