//! Error types for mapstyle-core

use thiserror::Error;

/// Hard failures of a style build.
///
/// Everything else (unknown layer types, unresolvable filter attributes,
/// malformed escape hatches) is recoverable and lands in the correction log.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Style name must not be empty")]
    EmptyStyleName,

    #[error("Unknown base style '{name}' (expected one of: {expected})")]
    UnknownBaseStyle { name: String, expected: String },

    #[error("Build request has no 'layers' list")]
    MissingLayers,
}

/// Failure to map a requested layer type onto a template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("No layer template or source layer matches '{layer_type}'")]
    LayerNotFound {
        layer_type: String,
        suggestions: Vec<String>,
    },
}

impl ResolveError {
    /// Candidate names worth showing to the caller.
    pub fn suggestions(&self) -> &[String] {
        match self {
            ResolveError::LayerNotFound { suggestions, .. } => suggestions,
        }
    }
}

/// Errors loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse engine configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid engine configuration: {0}")]
    Invalid(String),
}
