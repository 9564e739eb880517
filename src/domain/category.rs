//! Catalog categories and the listing URL scheme.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Category identifier is empty")]
    Empty,

    #[error("Category '{0}' is not a single URL path segment")]
    NotAPathSegment(String),
}

/// Opaque category identifier, one URL path segment (`telefoane-mobile`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn new(id: impl Into<String>) -> Result<Self, CategoryError> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err(CategoryError::Empty);
        }
        if id.contains(['/', '?', '#']) || id.chars().any(char::is_whitespace) {
            return Err(CategoryError::NotAPathSegment(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Listing URL for 1-based `page`.
    ///
    /// Page 1 is `{base}/{category}/c`, every other page `{base}/{category}/p{N}/c`.
    pub fn page_url(&self, base_url: &str, page: u32) -> String {
        let base = base_url.trim_end_matches('/');
        if page <= 1 {
            format!("{}/{}/c", base, self.0)
        } else {
            format!("{}/{}/p{}/c", base, self.0, page)
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = CategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl std::str::FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
