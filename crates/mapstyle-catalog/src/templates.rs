//! Layer template registry.
//!
//! A template maps an abstract layer type ("motorways", "parks", "city_labels")
//! to the source layer it draws from, its drawing primitive, default paint and
//! layout properties, and default filter clauses.
//!
//! Filter clauses use a small grammar:
//!
//! ```text
//! class: motorway|motorway_link, structure: none
//! ```
//!
//! Each `attr: v1|v2` clause is an inclusion test; comma-separated clauses and
//! separate clause strings are ANDed together.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeCatalog;
use crate::error::CatalogError;

/// Rendering mode of a style layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawingPrimitive {
    Fill,
    Line,
    Symbol,
    Circle,
    #[serde(alias = "extrusion")]
    FillExtrusion,
}

impl DrawingPrimitive {
    /// The style-spec layer type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawingPrimitive::Fill => "fill",
            DrawingPrimitive::Line => "line",
            DrawingPrimitive::Symbol => "symbol",
            DrawingPrimitive::Circle => "circle",
            DrawingPrimitive::FillExtrusion => "fill-extrusion",
        }
    }
}

impl std::fmt::Display for DrawingPrimitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `attr: v1|v2` clause of a template's default filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub attribute: String,
    pub values: Vec<String>,
}

/// Parse a clause string into its clauses.
///
/// Malformed pieces (no colon, empty attribute or no values) are skipped.
pub fn parse_filter_clauses(source: &str) -> Vec<FilterClause> {
    source
        .split(',')
        .filter_map(|piece| {
            let (attribute, values) = piece.split_once(':')?;
            let attribute = attribute.trim();
            let values: Vec<String> = values
                .split('|')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if attribute.is_empty() || values.is_empty() {
                return None;
            }
            Some(FilterClause {
                attribute: attribute.to_string(),
                values,
            })
        })
        .collect()
}

/// Defaults for one abstract layer type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerTemplate {
    /// Registry key; filled in from the map key when loading
    #[serde(skip)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub drawing_primitive: DrawingPrimitive,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paint: IndexMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub layout: IndexMap<String, serde_json::Value>,
    /// Default filter clause strings, ANDed together
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<String>,
}

impl LayerTemplate {
    /// Create an empty template for the given primitive.
    pub fn new(
        id: impl Into<String>,
        drawing_primitive: DrawingPrimitive,
        source_layer: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            drawing_primitive,
            source_layer,
            paint: IndexMap::new(),
            layout: IndexMap::new(),
            filter: Vec::new(),
        }
    }

    /// All default filter clauses, in declaration order.
    pub fn filter_clauses(&self) -> Vec<FilterClause> {
        self.filter
            .iter()
            .flat_map(|source| parse_filter_clauses(source))
            .collect()
    }

    pub fn is_label(&self) -> bool {
        self.drawing_primitive == DrawingPrimitive::Symbol
    }
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    templates: IndexMap<String, LayerTemplate>,
}

/// Immutable registry of layer templates, keyed by abstract layer type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, LayerTemplate>,
}

impl TemplateRegistry {
    /// Parse a registry from JSON of the form `{"templates": {"name": {...}}}`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawRegistry = serde_json::from_str(json)?;
        let mut templates = IndexMap::with_capacity(raw.templates.len());
        for (id, mut template) in raw.templates {
            if id.trim().is_empty() {
                return Err(CatalogError::InvalidTemplate {
                    id,
                    message: "template name must not be empty".to_string(),
                });
            }
            for source in &template.filter {
                if parse_filter_clauses(source).is_empty() {
                    return Err(CatalogError::InvalidTemplate {
                        id,
                        message: format!("filter clause '{}' has no 'attr: value' pairs", source),
                    });
                }
            }
            template.id = id.clone();
            templates.insert(id, template);
        }
        Ok(Self { templates })
    }

    /// Build a registry from already constructed templates (keyed by their ids).
    pub fn from_templates(templates: impl IntoIterator<Item = LayerTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|template| (template.id.clone(), template))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LayerTemplate> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Iterate templates in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerTemplate> {
        self.templates.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Check every template against a catalog.
    ///
    /// Returns one human-readable problem per unknown source layer or unknown
    /// filter attribute. An empty result means the registry is consistent.
    pub fn check_against(&self, catalog: &AttributeCatalog) -> Vec<String> {
        let mut problems = Vec::new();
        for template in self.iter() {
            let Some(source_layer) = template.source_layer.as_deref() else {
                continue;
            };
            let Some(schema) = catalog.source_layer(source_layer) else {
                problems.push(format!(
                    "{}: unknown source layer '{}'",
                    template.id, source_layer
                ));
                continue;
            };
            for clause in template.filter_clauses() {
                if !schema.has_attribute(&clause.attribute) {
                    problems.push(format!(
                        "{}: source layer '{}' has no attribute '{}'",
                        template.id, source_layer, clause.attribute
                    ));
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_clause() {
        let clauses = parse_filter_clauses("class: motorway|motorway_link");
        assert_eq!(
            clauses,
            vec![FilterClause {
                attribute: "class".to_string(),
                values: vec!["motorway".to_string(), "motorway_link".to_string()],
            }]
        );
    }

    #[test]
    fn test_parse_comma_separated_clauses() {
        let clauses = parse_filter_clauses("class: street , structure:bridge| tunnel");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].attribute, "structure");
        assert_eq!(clauses[1].values, vec!["bridge", "tunnel"]);
    }

    #[test]
    fn test_parse_skips_malformed_pieces() {
        assert!(parse_filter_clauses("no colon here").is_empty());
        assert!(parse_filter_clauses("class:").is_empty());
        assert_eq!(parse_filter_clauses(": x, class: park").len(), 1);
    }

    #[test]
    fn test_registry_sets_ids_from_keys() {
        let registry = TemplateRegistry::from_json(
            r##"{"templates": {
                "water": {"drawingPrimitive": "fill", "sourceLayer": "water",
                          "paint": {"fill-color": "#75cff0"}},
                "towers": {"drawingPrimitive": "extrusion"}
            }}"##,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("water").unwrap().id, "water");
        assert_eq!(
            registry.get("towers").unwrap().drawing_primitive,
            DrawingPrimitive::FillExtrusion
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["water", "towers"]);
    }

    #[test]
    fn test_registry_rejects_unparseable_filter() {
        let err = TemplateRegistry::from_json(
            r#"{"templates": {"bad": {"drawingPrimitive": "line", "filter": ["oops"]}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTemplate { ref id, .. } if id == "bad"));
    }

    #[test]
    fn test_check_against_reports_unknown_names() {
        let catalog = AttributeCatalog::from_json(
            r#"{"id": "test.tiles", "sourceLayers": {
                "road": {"geometry": "line", "attributes": {"class": {"values": ["street"]}}}
            }}"#,
        )
        .unwrap();
        let registry = TemplateRegistry::from_json(
            r#"{"templates": {
                "streets": {"drawingPrimitive": "line", "sourceLayer": "road", "filter": ["class: street"]},
                "bridges": {"drawingPrimitive": "line", "sourceLayer": "road", "filter": ["structure: bridge"]},
                "rivers": {"drawingPrimitive": "line", "sourceLayer": "waterway"}
            }}"#,
        )
        .unwrap();

        let problems = registry.check_against(&catalog).join("\n");
        insta::assert_snapshot!(problems, @r"
        bridges: source layer 'road' has no attribute 'structure'
        rivers: unknown source layer 'waterway'
        ");
    }

    #[test]
    fn test_primitive_names() {
        assert_eq!(DrawingPrimitive::FillExtrusion.as_str(), "fill-extrusion");
        assert_eq!(
            serde_json::to_value(DrawingPrimitive::FillExtrusion).unwrap(),
            serde_json::json!("fill-extrusion")
        );
    }
}
