//! Attribute catalog: the filterable attributes of every vector tile source layer.
//!
//! The catalog is the authoritative set used to validate and correct filter
//! values. Each source layer lists its attributes, and each attribute has one of
//! three domains:
//!
//! - **Enumerated**: a closed list of legal string values (`"values": [...]`)
//! - **Range**: a numeric interval (`"range": [min, max]`)
//! - **Free text**: anything goes (neither key present)
//!
//! ```json
//! {
//!   "id": "mapbox.mapbox-streets-v8",
//!   "sourceLayers": {
//!     "road": {
//!       "description": "Roads",
//!       "geometry": "line",
//!       "attributes": {
//!         "class": { "description": "Road classification", "values": ["motorway", "street"] },
//!         "layer": { "description": "Vertical ordering", "range": [-5, 5] },
//!         "name": { "description": "Local name" }
//!       }
//!     }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Geometry stored in a source layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Point,
    Line,
    Polygon,
}

/// The set of values an attribute may take.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeDomain {
    /// Closed list of legal string values, in catalog order
    Enumerated(Vec<String>),
    /// Inclusive numeric interval
    Range { min: f64, max: f64 },
    /// Unconstrained text
    FreeText,
}

/// A single filterable attribute of a source layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAttribute", into = "RawAttribute")]
pub struct AttributeSpec {
    pub description: String,
    pub domain: AttributeDomain,
}

impl AttributeSpec {
    /// Legal values of an enumerated attribute (empty for ranges and free text).
    pub fn legal_values(&self) -> &[String] {
        match &self.domain {
            AttributeDomain::Enumerated(values) => values,
            _ => &[],
        }
    }

    pub fn is_enumerated(&self) -> bool {
        matches!(self.domain, AttributeDomain::Enumerated(_))
    }

    pub fn is_free_text(&self) -> bool {
        matches!(self.domain, AttributeDomain::FreeText)
    }

    /// Numeric bounds of a range attribute.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self.domain {
            AttributeDomain::Range { min, max } => Some((min, max)),
            _ => None,
        }
    }

    /// Whether the legal value set literally contains the strings "true" and "false".
    ///
    /// Only such attributes get boolean-like filter values coerced to strings.
    pub fn has_string_booleans(&self) -> bool {
        let values = self.legal_values();
        values.iter().any(|v| v == "true") && values.iter().any(|v| v == "false")
    }
}

/// Serialized form of an attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAttribute {
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<[f64; 2]>,
}

impl TryFrom<RawAttribute> for AttributeSpec {
    type Error = String;

    fn try_from(raw: RawAttribute) -> Result<Self, Self::Error> {
        let domain = match (raw.values, raw.range) {
            (Some(_), Some(_)) => {
                return Err("attribute cannot declare both 'values' and 'range'".to_string());
            }
            (Some(values), None) if values.is_empty() => {
                return Err("enumerated attribute must list at least one value".to_string());
            }
            (Some(values), None) => AttributeDomain::Enumerated(values),
            (None, Some([min, max])) if min > max => {
                return Err(format!("range minimum {} exceeds maximum {}", min, max));
            }
            (None, Some([min, max])) => AttributeDomain::Range { min, max },
            (None, None) => AttributeDomain::FreeText,
        };
        Ok(AttributeSpec {
            description: raw.description,
            domain,
        })
    }
}

impl From<AttributeSpec> for RawAttribute {
    fn from(spec: AttributeSpec) -> Self {
        let (values, range) = match spec.domain {
            AttributeDomain::Enumerated(values) => (Some(values), None),
            AttributeDomain::Range { min, max } => (None, Some([min, max])),
            AttributeDomain::FreeText => (None, None),
        };
        RawAttribute {
            description: spec.description,
            values,
            range,
        }
    }
}

/// Schema of one source layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLayerSchema {
    #[serde(default)]
    pub description: String,
    pub geometry: Geometry,
    /// Polygon layers that carry height data and can be drawn in 3D
    #[serde(default)]
    pub extrudable: bool,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeSpec>,
}

impl SourceLayerSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// Per-source-layer attribute catalog for one tileset version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeCatalog {
    /// Tileset identifier (e.g. "mapbox.mapbox-streets-v8")
    pub id: String,
    #[serde(rename = "sourceLayers")]
    source_layers: IndexMap<String, SourceLayerSchema>,
}

impl AttributeCatalog {
    /// Parse a catalog from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn source_layer(&self, name: &str) -> Option<&SourceLayerSchema> {
        self.source_layers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.source_layers.contains_key(name)
    }

    /// Iterate source layers in catalog order.
    pub fn source_layers(&self) -> impl Iterator<Item = (&str, &SourceLayerSchema)> {
        self.source_layers
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn source_layer_names(&self) -> impl Iterator<Item = &str> {
        self.source_layers.keys().map(String::as_str)
    }

    /// Look up one attribute of one source layer.
    pub fn attribute(&self, source_layer: &str, attribute: &str) -> Option<&AttributeSpec> {
        self.source_layer(source_layer)
            .and_then(|schema| schema.attribute(attribute))
    }

    /// Whether a source layer holds label points (its name ends in `_label`).
    pub fn is_label_layer(name: &str) -> bool {
        name.ends_with("_label")
    }

    pub fn len(&self) -> usize {
        self.source_layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_catalog() -> AttributeCatalog {
        AttributeCatalog::from_json(
            r#"{
                "id": "test.tiles",
                "sourceLayers": {
                    "road": {
                        "geometry": "line",
                        "attributes": {
                            "class": { "description": "Road class", "values": ["motorway", "street"] },
                            "oneway": { "values": ["true", "false"] },
                            "layer": { "range": [-5, 5] },
                            "name": { "description": "Local name" }
                        }
                    },
                    "poi_label": { "geometry": "point" }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_attribute_domains() {
        let catalog = tiny_catalog();

        let class = catalog.attribute("road", "class").unwrap();
        assert!(class.is_enumerated());
        assert_eq!(class.legal_values(), ["motorway", "street"]);

        let layer = catalog.attribute("road", "layer").unwrap();
        assert_eq!(layer.range(), Some((-5.0, 5.0)));
        assert!(layer.legal_values().is_empty());

        let name = catalog.attribute("road", "name").unwrap();
        assert!(name.is_free_text());
    }

    #[test]
    fn test_string_booleans_are_literal() {
        let catalog = tiny_catalog();
        assert!(catalog.attribute("road", "oneway").unwrap().has_string_booleans());
        assert!(!catalog.attribute("road", "class").unwrap().has_string_booleans());
    }

    #[test]
    fn test_source_layer_order_is_preserved() {
        let catalog = tiny_catalog();
        let names: Vec<_> = catalog.source_layer_names().collect();
        assert_eq!(names, vec!["road", "poi_label"]);
        assert!(catalog.source_layer("poi_label").unwrap().attributes.is_empty());
    }

    #[test]
    fn test_label_layer_detection() {
        assert!(AttributeCatalog::is_label_layer("poi_label"));
        assert!(!AttributeCatalog::is_label_layer("motorway_junction"));
    }

    #[test]
    fn test_rejects_values_and_range_together() {
        let result = AttributeCatalog::from_json(
            r#"{"id": "x", "sourceLayers": {"a": {"geometry": "point", "attributes": {
                "b": {"values": ["1"], "range": [0, 1]}
            }}}}"#,
        );
        assert!(matches!(result, Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let result = AttributeCatalog::from_json(
            r#"{"id": "x", "sourceLayers": {"a": {"geometry": "point", "attributes": {
                "b": {"range": [5, 1]}
            }}}}"#,
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("range minimum 5 exceeds maximum 1"));
    }

    #[test]
    fn test_serialization_keeps_shape() {
        let catalog = tiny_catalog();
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            json["sourceLayers"]["road"]["attributes"]["layer"]["range"],
            serde_json::json!([-5.0, 5.0])
        );
        assert!(json["sourceLayers"]["road"]["attributes"]["name"]
            .get("values")
            .is_none());
    }
}
