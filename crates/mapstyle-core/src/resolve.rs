//! Layer resolution.
//!
//! Maps a requested layer type onto a [`LayerTemplate`]:
//!
//! 1. an exact registry entry wins outright
//! 2. a real source layer name gets a template inferred from its geometry
//! 3. with filter properties, the source layer whose schema best fits them is
//!    chosen and treated as in step 2
//! 4. otherwise resolution fails with suggestions

use std::borrow::Cow;

use indexmap::IndexMap;
use mapstyle_catalog::{
    AttributeCatalog, AttributeDomain, DrawingPrimitive, Geometry, LayerTemplate,
    SourceLayerSchema, TemplateRegistry,
};
use serde_json::{Value, json};

use crate::corrections::{Correction, CorrectionCode, CorrectionLog};
use crate::error::ResolveError;
use crate::similarity::{closest_names, loosely_equal, strip_separators};

const ATTRIBUTE_NAME_SCORE: u32 = 10;
const EXACT_VALUE_SCORE: u32 = 20;
const PARTIAL_VALUE_SCORE: u32 = 5;
const FREE_TEXT_SCORE: u32 = 5;

pub struct LayerResolver<'a> {
    catalog: &'a AttributeCatalog,
    templates: &'a TemplateRegistry,
}

impl<'a> LayerResolver<'a> {
    pub fn new(catalog: &'a AttributeCatalog, templates: &'a TemplateRegistry) -> Self {
        Self { catalog, templates }
    }

    /// Resolve `layer_type` to a template, recording any correction in `log`.
    pub fn resolve(
        &self,
        layer_type: &str,
        filter_props: Option<&IndexMap<String, Value>>,
        log: &mut CorrectionLog,
    ) -> Result<Cow<'a, LayerTemplate>, ResolveError> {
        if let Some(template) = self.templates.get(layer_type) {
            tracing::debug!(layer_type, "Resolved registry template");
            return Ok(Cow::Borrowed(template));
        }

        if let Some(schema) = self.catalog.source_layer(layer_type) {
            tracing::debug!(layer_type, "Inferred template from source layer");
            return Ok(Cow::Owned(infer_template(layer_type, schema)));
        }

        if let Some(props) = filter_props.filter(|props| !props.is_empty())
            && let Some((name, schema)) = self.best_source_layer(props)
        {
            log.push(Correction::new(
                CorrectionCode::LayerTypeCorrected,
                layer_type,
                format!(
                    "unknown layer type resolved to source layer '{}' from its filter properties",
                    name
                ),
            ));
            return Ok(Cow::Owned(infer_template(name, schema)));
        }

        Err(ResolveError::LayerNotFound {
            layer_type: layer_type.to_string(),
            suggestions: self.suggestions(layer_type),
        })
    }

    /// The source layer scoring highest against the filter properties.
    ///
    /// Ties go to the earlier layer in catalog order; a zero score is no match.
    fn best_source_layer(
        &self,
        props: &IndexMap<String, Value>,
    ) -> Option<(&'a str, &'a SourceLayerSchema)> {
        let mut best: Option<(&str, &SourceLayerSchema, u32)> = None;
        for (name, schema) in self.catalog.source_layers() {
            let score = score_source_layer(schema, props);
            tracing::trace!(source_layer = name, score, "Scored source layer");
            if score > 0 && best.is_none_or(|(_, _, top)| score > top) {
                best = Some((name, schema, score));
            }
        }
        best.map(|(name, schema, _)| (name, schema))
    }

    fn suggestions(&self, layer_type: &str) -> Vec<String> {
        let names = self
            .templates
            .names()
            .chain(self.catalog.source_layer_names());
        let mut suggestions = Vec::new();
        for name in closest_names(layer_type, names) {
            if !suggestions.contains(&name) {
                suggestions.push(name);
            }
        }
        suggestions.truncate(5);
        suggestions
    }
}

/// Score how well a source layer fits a set of filter properties.
pub fn score_source_layer(schema: &SourceLayerSchema, props: &IndexMap<String, Value>) -> u32 {
    let mut score = 0;
    for (attribute, value) in props {
        let values = value_strings(value);
        match schema.attribute(attribute) {
            Some(spec) => {
                score += ATTRIBUTE_NAME_SCORE;
                for value in &values {
                    score += match &spec.domain {
                        AttributeDomain::Enumerated(legal) => enumerated_score(value, legal),
                        AttributeDomain::FreeText => FREE_TEXT_SCORE,
                        AttributeDomain::Range { .. } => 0,
                    };
                }
            }
            None => {
                // values may still name legal values of some other attribute
                for value in &values {
                    score += schema
                        .attributes
                        .values()
                        .map(|spec| enumerated_score(value, spec.legal_values()))
                        .max()
                        .unwrap_or(0);
                }
            }
        }
    }
    score
}

fn enumerated_score(value: &str, legal: &[String]) -> u32 {
    if legal.iter().any(|v| loosely_equal(v, value)) {
        return EXACT_VALUE_SCORE;
    }
    let needle = strip_separators(value);
    if needle.len() >= 3 && legal.iter().any(|v| strip_separators(v).contains(&needle)) {
        return PARTIAL_VALUE_SCORE;
    }
    0
}

/// String forms of the scalar values of a filter property.
fn value_strings(value: &Value) -> Vec<String> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    match value {
        Value::Array(items) => items.iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    }
}

/// Build a template for a bare source layer from its geometry.
pub fn infer_template(source_layer: &str, schema: &SourceLayerSchema) -> LayerTemplate {
    let primitive = match schema.geometry {
        Geometry::Point if AttributeCatalog::is_label_layer(source_layer) => DrawingPrimitive::Symbol,
        Geometry::Point => DrawingPrimitive::Circle,
        Geometry::Line => DrawingPrimitive::Line,
        Geometry::Polygon if schema.extrudable => DrawingPrimitive::FillExtrusion,
        Geometry::Polygon => DrawingPrimitive::Fill,
    };

    let mut template = LayerTemplate::new(source_layer, primitive, Some(source_layer.to_string()));
    template.description = schema.description.clone();
    let (paint, layout) = primitive_defaults(primitive);
    template.paint = paint;
    template.layout = layout;
    template
}

fn primitive_defaults(
    primitive: DrawingPrimitive,
) -> (IndexMap<String, Value>, IndexMap<String, Value>) {
    let pairs = |entries: Vec<(&str, Value)>| -> IndexMap<String, Value> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    };
    match primitive {
        DrawingPrimitive::Fill => (
            pairs(vec![("fill-color", json!("#cccccc")), ("fill-opacity", json!(0.7))]),
            IndexMap::new(),
        ),
        DrawingPrimitive::Line => (
            pairs(vec![("line-color", json!("#888888")), ("line-opacity", json!(1))]),
            pairs(vec![("line-cap", json!("round")), ("line-join", json!("round"))]),
        ),
        DrawingPrimitive::Symbol => (
            pairs(vec![("text-color", json!("#333333"))]),
            pairs(vec![
                ("text-field", json!(["coalesce", ["get", "name_en"], ["get", "name"]])),
                ("text-size", json!(12)),
            ]),
        ),
        DrawingPrimitive::Circle => (
            pairs(vec![
                ("circle-color", json!("#666666")),
                ("circle-radius", json!(4)),
                ("circle-opacity", json!(1)),
            ]),
            IndexMap::new(),
        ),
        DrawingPrimitive::FillExtrusion => (
            pairs(vec![
                ("fill-extrusion-color", json!("#d9d0c9")),
                ("fill-extrusion-height", json!(["get", "height"])),
                ("fill-extrusion-base", json!(["get", "min_height"])),
                ("fill-extrusion-opacity", json!(0.8)),
            ]),
            IndexMap::new(),
        ),
    }
}
