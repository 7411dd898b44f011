//! Layout synthesis.

use indexmap::IndexMap;
use mapstyle_catalog::{DrawingPrimitive, LayerTemplate};
use serde_json::{Value, json};

use crate::request::{LayerAction, LayerRequest};

/// Layout families for label layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelArchetype {
    /// Countries, states, cities, neighborhoods
    Place,
    /// Names drawn along road lines
    Road,
    /// Points of interest, transit stops and other point labels
    Poi,
}

const PLACE_WORDS: &[&str] = &[
    "place",
    "country",
    "state",
    "city",
    "town",
    "village",
    "settlement",
    "neighborhood",
    "neighbourhood",
];

const ROAD_WORDS: &[&str] = &["road", "street", "motorway", "highway"];

impl LabelArchetype {
    /// Pick the archetype from the layer type name.
    pub fn for_layer_type(layer_type: &str) -> Self {
        let name = layer_type.to_lowercase();
        if PLACE_WORDS.iter().any(|word| name.contains(word)) {
            LabelArchetype::Place
        } else if ROAD_WORDS.iter().any(|word| name.contains(word)) {
            LabelArchetype::Road
        } else {
            LabelArchetype::Poi
        }
    }

    fn defaults(&self) -> Vec<(&'static str, Value)> {
        match self {
            LabelArchetype::Place => vec![
                ("text-field", json!(["coalesce", ["get", "name_en"], ["get", "name"]])),
                ("text-font", json!(["DIN Pro Medium", "Arial Unicode MS Regular"])),
                ("text-size", json!(["interpolate", ["linear"], ["zoom"], 3, 10, 8, 13, 12, 16])),
                ("text-max-width", json!(8)),
                ("text-anchor", json!("center")),
            ],
            LabelArchetype::Road => vec![
                ("text-field", json!(["get", "name"])),
                ("text-font", json!(["DIN Pro Regular", "Arial Unicode MS Regular"])),
                ("text-size", json!(["interpolate", ["linear"], ["zoom"], 10, 10, 18, 14])),
                ("symbol-placement", json!("line")),
                ("text-rotation-alignment", json!("map")),
                ("text-max-angle", json!(30)),
            ],
            LabelArchetype::Poi => vec![
                ("text-field", json!(["coalesce", ["get", "name_en"], ["get", "name"]])),
                ("text-font", json!(["DIN Pro Regular", "Arial Unicode MS Regular"])),
                ("text-size", json!(11)),
                ("text-anchor", json!("top")),
                ("text-max-width", json!(8)),
                ("text-padding", json!(2)),
            ],
        }
    }
}

/// Synthesize the layout properties of one layer.
///
/// Label layers start from their archetype, with template layout entries
/// taking precedence. Other layers use the template layout as is.
pub fn synthesize_layout(template: &LayerTemplate, request: &LayerRequest) -> IndexMap<String, Value> {
    let mut layout: IndexMap<String, Value> = IndexMap::new();

    if template.drawing_primitive == DrawingPrimitive::Symbol {
        let archetype = LabelArchetype::for_layer_type(&request.layer_type);
        tracing::trace!(layer_type = %request.layer_type, ?archetype, "Label archetype");
        for (property, value) in archetype.defaults() {
            layout.insert(property.to_string(), value);
        }
    }

    for (property, value) in &template.layout {
        layout.insert(property.clone(), value.clone());
    }

    if request.action == LayerAction::Show {
        layout.insert("visibility".to_string(), json!("visible"));
    }

    layout
}
