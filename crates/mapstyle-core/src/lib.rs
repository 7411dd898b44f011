//! Map style builder engine.
//!
//! Converts a declarative list of layer instructions ("make motorways red",
//! "hide labels", "highlight bridges") into a complete Mapbox GL style
//! document (version 8), correcting typos and synonyms against an attribute
//! catalog along the way.
//!
//! ```ignore
//! use mapstyle_core::{BuildRequest, LayerAction, LayerRequest, StyleEngine};
//!
//! let mut water = LayerRequest::new("water", LayerAction::Color);
//! water.color = Some("0066ff".to_string());
//! let request = BuildRequest::new("My style", "blank").with_layer(water);
//!
//! let output = StyleEngine::builtin().build(&request)?;
//! println!("{}", output.document.to_json_string(true)?);
//! ```
//!
//! The pipeline per layer request is:
//!
//! 1. [`resolve`]: layer type to template
//! 2. [`filter`]: request and template filters to one expression
//! 3. [`paint`] and [`layout`]: property synthesis
//! 4. [`assemble`]: placement into the base style's skeleton
//!
//! Builds are pure and deterministic: identical input and catalog produce
//! byte-identical output.

pub mod assemble;
pub mod config;
pub mod corrections;
pub mod document;
pub mod error;
pub mod expression;
pub mod filter;
pub mod layout;
pub mod paint;
pub mod request;
pub mod resolve;
pub mod similarity;

pub use assemble::{BuildOutput, StyleEngine};
pub use config::{EngineConfig, SimilarityConfig};
pub use corrections::{Correction, CorrectionCode, CorrectionKind, CorrectionLog};
pub use document::{LayerKind, SourceSpec, StyleDocument, StyleImport, StyleLayer};
pub use error::{BuildError, ConfigError, ResolveError};
pub use request::{
    BaseStyle, BuildRequest, GlobalSettings, LayerAction, LayerRequest, Mode, Skeleton,
    SlottedConfig,
};
