//! Progress events emitted while a run is in flight
//!
//! The scheduler publishes these on an optional channel so a caller can render
//! progress without polling the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// A batch is about to start all of its categories
    BatchStarted {
        index: usize,
        total_batches: usize,
        categories: Vec<Category>,
        timestamp: DateTime<Utc>,
    },
    /// One category task settled, successfully or not
    CategoryFinished {
        batch_index: usize,
        category: Category,
        products_found: Option<usize>,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Every task of the batch settled
    BatchCompleted {
        index: usize,
        succeeded: usize,
        failed: usize,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl SchedulerEvent {
    pub const fn is_batch_completed(&self) -> bool {
        matches!(self, Self::BatchCompleted { .. })
    }
}
