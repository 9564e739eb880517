//! Pagination geometry.
//!
//! Responsibility:
//! - parse the listing footer label (`"1-40 din 527 de produse"`)
//! - derive page size and page count from page 1
//! - expected product count per page and the slot-scan window

use serde::{Deserialize, Serialize};
use thiserror::Error;

const RANGE_MARKER: &str = "din";
const TOTAL_SUFFIX: &str = "de produse";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationLabelError {
    #[error("Pagination label '{label}' has no 'din' marker")]
    MissingMarker { label: String },

    #[error("Pagination label '{label}' has no '<start>-<end>' range")]
    MalformedRange { label: String },

    #[error("Pagination label '{label}' has an unreadable number '{value}'")]
    InvalidNumber { label: String, value: String },

    #[error("Pagination label '{label}' has an inverted range {start}-{end}")]
    InvertedRange { label: String, start: u32, end: u32 },
}

/// Geometry of one listing page as advertised by its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    /// 1-based ordinal of the first product shown
    pub current_page_start: u32,
    /// 1-based ordinal of the last product shown, inclusive
    pub current_page_end: u32,
    pub total_products: u32,
}

impl PaginationInfo {
    /// Parse `"<start>-<end> din <total> de produse"`
    pub fn parse(label: &str) -> Result<Self, PaginationLabelError> {
        let (range, total) = label
            .split_once(RANGE_MARKER)
            .ok_or_else(|| PaginationLabelError::MissingMarker {
                label: label.to_string(),
            })?;

        let total = total.replace(TOTAL_SUFFIX, "");
        let total_products = parse_count(label, &total)?;

        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| PaginationLabelError::MalformedRange {
                label: label.to_string(),
            })?;
        let current_page_start = parse_count(label, start)?;
        let current_page_end = parse_count(label, end)?;

        if current_page_start == 0 || current_page_end < current_page_start {
            return Err(PaginationLabelError::InvertedRange {
                label: label.to_string(),
                start: current_page_start,
                end: current_page_end,
            });
        }

        Ok(Self {
            current_page_start,
            current_page_end,
            total_products,
        })
    }

    pub const fn page_size(&self) -> u32 {
        self.current_page_end - self.current_page_start + 1
    }

    pub const fn page_count(&self) -> u32 {
        page_count(self.total_products, self.page_size())
    }

    /// Products expected on 1-based `page_index`; the last page may be short
    pub const fn expected_on_page(&self, page_index: u32) -> u32 {
        expected_on_page(self.total_products, self.page_size(), page_index)
    }
}

/// `ceil(total / page_size)`
pub const fn page_count(total_products: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let full = total_products / page_size;
    if total_products % page_size == 0 { full } else { full + 1 }
}

pub const fn expected_on_page(total_products: u32, page_size: u32, page_index: u32) -> u32 {
    if page_index == 0 {
        return 0;
    }
    let before = (page_index - 1).saturating_mul(page_size);
    let remaining = total_products.saturating_sub(before);
    if remaining < page_size { remaining } else { page_size }
}

/// Highest slot index scanned for a page of `boundary` products:
/// `ceil(tolerance * boundary)`, never below `boundary`.
pub fn scan_limit(boundary: u32, tolerance: f64) -> u32 {
    let raw = f64::from(boundary) * tolerance;
    // Drop float noise (1.05 * 40 = 42.000000000000004) before rounding up.
    let rounded = (raw * 1e6).round() / 1e6;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let limit = rounded.ceil() as u32;
    limit.max(boundary)
}

fn parse_count(label: &str, fragment: &str) -> Result<u32, PaginationLabelError> {
    let digits: String = fragment
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != ',')
        .collect();

    digits.parse().map_err(|_| PaginationLabelError::InvalidNumber {
        label: label.to_string(),
        value: fragment.trim().to_string(),
    })
}
