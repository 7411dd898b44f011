//! Error types for catalog and registry loading.

use thiserror::Error;

/// Errors that can occur while loading an attribute catalog or template registry
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The asset is not valid JSON or doesn't have the expected shape
    #[error("Failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A template entry is internally inconsistent
    #[error("Invalid layer template '{id}': {message}")]
    InvalidTemplate { id: String, message: String },
}
