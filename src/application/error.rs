//! Crawl errors
//!
//! `CrawlError` ends one category's run and is reported in its outcome.
//! `SkipReason` only ever costs a single slot and never leaves the extractor.

use thiserror::Error;

use crate::domain::{PaginationLabelError, PriceParseError};
use crate::infrastructure::browser::BrowserError;
use crate::infrastructure::export::ExportError;

/// Fatal error for one category
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Could not open a {engine} session: {source}")]
    Session {
        engine: &'static str,
        #[source]
        source: BrowserError,
    },

    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("Pagination label not found on {url}: {source}")]
    PaginationLabelMissing {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error(transparent)]
    PaginationLabel(#[from] PaginationLabelError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CrawlError {
    /// Short machine-friendly name for logs and events
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Session { .. } => "session",
            Self::Navigation { .. } => "navigation",
            Self::PaginationLabelMissing { .. } => "pagination_label_missing",
            Self::PaginationLabel(_) => "pagination_label",
            Self::Export(_) => "export",
        }
    }
}

/// Why a slot produced no product
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no card at this position: {0}")]
    NoCard(BrowserError),

    #[error("title unreadable: {0}")]
    TitleUnreadable(BrowserError),

    #[error("card has no title")]
    EmptyTitle,

    #[error("link region not found: {0}")]
    NoLinkRegion(BrowserError),

    #[error("price unreadable: {0}")]
    PriceUnreadable(BrowserError),

    #[error(transparent)]
    InvalidPrice(#[from] PriceParseError),
}
