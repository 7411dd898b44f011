//! Built-in catalog assets.
//!
//! The Mapbox Streets v8 attribute catalog and the default template registry are
//! embedded with `include_str!()` and parsed on first use, so there is no
//! runtime file I/O.

use once_cell::sync::Lazy;

use crate::attributes::AttributeCatalog;
use crate::templates::TemplateRegistry;

/// Attribute catalog for the `mapbox.mapbox-streets-v8` tileset.
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid. This can only
/// happen if someone edits `data/streets-v8.json` incorrectly.
pub static STREETS_V8: Lazy<AttributeCatalog> = Lazy::new(|| {
    AttributeCatalog::from_json(include_str!("../data/streets-v8.json"))
        .expect("Invalid built-in attribute catalog - this is a bug in mapstyle")
});

/// Default layer template registry, written against [`STREETS_V8`].
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid.
pub static BUILTIN_TEMPLATES: Lazy<TemplateRegistry> = Lazy::new(|| {
    TemplateRegistry::from_json(include_str!("../data/layer-templates.json"))
        .expect("Invalid built-in template registry - this is a bug in mapstyle")
});

/// The built-in Streets v8 catalog.
pub fn streets_v8() -> &'static AttributeCatalog {
    &STREETS_V8
}

/// The built-in template registry.
pub fn builtin_templates() -> &'static TemplateRegistry {
    &BUILTIN_TEMPLATES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert_eq!(streets_v8().id, "mapbox.mapbox-streets-v8");
        assert!(!streets_v8().is_empty());
    }

    #[test]
    fn test_registry_loads() {
        assert!(builtin_templates().contains("water"));
        assert!(builtin_templates().contains("motorways"));
    }
}
