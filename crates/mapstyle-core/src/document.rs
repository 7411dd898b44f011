//! Style document model (Mapbox GL style, version 8).
//!
//! Only the parts the engine emits are modeled. Paint, layout and filter
//! values stay as `serde_json::Value` since they are expression trees.

use indexmap::IndexMap;
use mapstyle_catalog::DrawingPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Style spec version emitted by the engine.
pub const STYLE_VERSION: u8 = 8;

/// Layer `type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Background,
    Raster,
    Fill,
    Line,
    Symbol,
    Circle,
    FillExtrusion,
}

impl From<DrawingPrimitive> for LayerKind {
    fn from(primitive: DrawingPrimitive) -> Self {
        match primitive {
            DrawingPrimitive::Fill => LayerKind::Fill,
            DrawingPrimitive::Line => LayerKind::Line,
            DrawingPrimitive::Symbol => LayerKind::Symbol,
            DrawingPrimitive::Circle => LayerKind::Circle,
            DrawingPrimitive::FillExtrusion => LayerKind::FillExtrusion,
        }
    }
}

/// A data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Vector {
        url: String,
    },
    Raster {
        url: String,
        #[serde(rename = "tileSize")]
        tile_size: u32,
    },
}

/// An imported style (slotted skeleton only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleImport {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub name: String,
}

/// One layer of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        default,
        rename = "source-layer",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub layout: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paint: IndexMap<String, Value>,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            source_layer: None,
            slot: None,
            filter: None,
            minzoom: None,
            maxzoom: None,
            layout: IndexMap::new(),
            paint: IndexMap::new(),
        }
    }

    /// A `background` layer painted with one color.
    pub fn background(color: &str) -> Self {
        let mut layer = Self::new("background", LayerKind::Background);
        layer
            .paint
            .insert("background-color".to_string(), Value::String(color.to_string()));
        layer
    }
}

/// A complete style document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    pub version: u8,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<StyleImport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub sources: IndexMap<String, SourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyphs: Option<String>,
    pub layers: Vec<StyleLayer>,
}

impl StyleDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: STYLE_VERSION,
            name: name.into(),
            imports: Vec::new(),
            projection: None,
            sources: IndexMap::new(),
            sprite: None,
            glyphs: None,
            layers: Vec::new(),
        }
    }

    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }

    /// Serialize to JSON text.
    pub fn to_json_string(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
