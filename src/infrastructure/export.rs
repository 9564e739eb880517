//! Per-category JSON export
//!
//! Each category is written to `{directory}/{category}.json` as an array of
//! products. Files are overwritten in place.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::domain::{Category, Product};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize products for '{category}': {source}")]
    Serialize {
        category: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes product lists as JSON documents
#[derive(Debug, Clone)]
pub struct JsonExporter {
    directory: PathBuf,
    pretty: bool,
}

impl JsonExporter {
    pub fn new(directory: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            directory: directory.into(),
            pretty,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Target file of `category`
    pub fn path_for(&self, category: &Category) -> PathBuf {
        self.directory.join(format!("{category}.json"))
    }

    /// Write `products` and return the file path
    pub async fn export(
        &self,
        category: &Category,
        products: &[Product],
    ) -> Result<PathBuf, ExportError> {
        let body = if self.pretty {
            serde_json::to_vec_pretty(products)
        } else {
            serde_json::to_vec(products)
        }
        .map_err(|source| ExportError::Serialize {
            category: category.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| ExportError::Io {
                path: self.directory.clone(),
                source,
            })?;

        let path = self.path_for(category);
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        info!("Exported {} products to {}", products.len(), path.display());
        Ok(path)
    }
}
