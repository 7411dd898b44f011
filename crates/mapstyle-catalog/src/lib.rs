//! Vector tile attribute catalog and layer template registry.
//!
//! This crate holds the read-only data the style engine works against:
//!
//! - [`AttributeCatalog`]: per source layer, the filterable attributes and their
//!   legal values, numeric ranges or free-text flag, plus the layer geometry
//! - [`TemplateRegistry`]: abstract layer types ("motorways", "parks") mapped to
//!   a source layer, drawing primitive, default paint/layout and filter clauses
//!
//! Both are immutable once loaded. The built-in versions ([`streets_v8()`] and
//! [`builtin_templates()`]) are embedded at compile time; alternative versions
//! can be supplied with [`AttributeCatalog::from_json`] and
//! [`TemplateRegistry::from_json`].

pub mod attributes;
pub mod builtin;
pub mod error;
pub mod templates;

pub use attributes::{AttributeCatalog, AttributeDomain, AttributeSpec, Geometry, SourceLayerSchema};
pub use builtin::{BUILTIN_TEMPLATES, STREETS_V8, builtin_templates, streets_v8};
pub use error::CatalogError;
pub use templates::{
    DrawingPrimitive, FilterClause, LayerTemplate, TemplateRegistry, parse_filter_clauses,
};
