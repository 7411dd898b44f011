//! Paint synthesis.
//!
//! Computes the paint properties of one layer from its template, the request
//! and the global settings. Rules are applied in order (color, opacity, width),
//! then the template fills whatever is still unset, then label halos and, for
//! slotted styles, emissive strength are added if missing.

use indexmap::IndexMap;
use mapstyle_catalog::{DrawingPrimitive, LayerTemplate};
use serde_json::{Value, json};

use crate::corrections::{Correction, CorrectionCode, CorrectionLog};
use crate::expression::{self, num};
use crate::request::{GlobalSettings, LayerAction, LayerRequest, Mode};

/// Zoom at which a zoom-based color switches to the requested color.
const DEFAULT_COLOR_MIN_ZOOM: f64 = 12.0;
/// Zoom range of a zoom-based width curve.
const DEFAULT_WIDTH_ZOOM_RANGE: (f64, f64) = (5.0, 18.0);
/// Scale applied to default width curves for highlighted layers.
const HIGHLIGHT_WIDTH_SCALE: f64 = 1.2;
const HALO_WIDTH: f64 = 1.5;

/// Style-wide inputs to paint synthesis.
#[derive(Debug, Clone, Copy)]
pub struct PaintContext<'a> {
    pub settings: &'a GlobalSettings,
    pub mode: Mode,
    /// Custom layers are placed into an imported basemap
    pub slotted: bool,
}

pub fn color_property(primitive: DrawingPrimitive) -> &'static str {
    match primitive {
        DrawingPrimitive::Fill => "fill-color",
        DrawingPrimitive::Line => "line-color",
        DrawingPrimitive::Symbol => "text-color",
        DrawingPrimitive::Circle => "circle-color",
        DrawingPrimitive::FillExtrusion => "fill-extrusion-color",
    }
}

pub fn opacity_property(primitive: DrawingPrimitive) -> &'static str {
    match primitive {
        DrawingPrimitive::Fill => "fill-opacity",
        DrawingPrimitive::Line => "line-opacity",
        DrawingPrimitive::Symbol => "text-opacity",
        DrawingPrimitive::Circle => "circle-opacity",
        DrawingPrimitive::FillExtrusion => "fill-extrusion-opacity",
    }
}

fn emissive_property(primitive: DrawingPrimitive) -> Option<&'static str> {
    match primitive {
        DrawingPrimitive::Fill => Some("fill-emissive-strength"),
        DrawingPrimitive::Line => Some("line-emissive-strength"),
        DrawingPrimitive::Symbol => Some("text-emissive-strength"),
        DrawingPrimitive::Circle => Some("circle-emissive-strength"),
        DrawingPrimitive::FillExtrusion => None,
    }
}

/// Normalize a caller color: bare or prefixed hex gets a lowercase `#` form,
/// anything else (named colors, `rgb()`, `hsl()`) passes through trimmed.
pub fn normalize_color(input: &str) -> String {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("#{}", hex.to_lowercase())
    } else {
        trimmed.to_string()
    }
}

/// Synthesize the paint properties of one layer.
pub fn synthesize_paint(
    template: &LayerTemplate,
    request: &LayerRequest,
    ctx: &PaintContext<'_>,
    log: &mut CorrectionLog,
) -> IndexMap<String, Value> {
    let primitive = template.drawing_primitive;
    let mut paint: IndexMap<String, Value> = IndexMap::new();

    if let Some(color) = color_value(template, request, ctx, log) {
        paint.insert(color_property(primitive).to_string(), color);
    }

    if primitive == DrawingPrimitive::Symbol {
        paint.insert("text-opacity".to_string(), json!(1));
    } else {
        let opacity = opacity_value(template, request, log);
        paint.insert(opacity_property(primitive).to_string(), opacity);
    }

    if primitive == DrawingPrimitive::Line
        && let Some(width) = width_value(template, request, log)
    {
        paint.insert("line-width".to_string(), width);
    }

    for (property, value) in &template.paint {
        if property != "line-width" && !paint.contains_key(property) {
            paint.insert(property.clone(), value.clone());
        }
    }

    if primitive == DrawingPrimitive::Symbol {
        let halo = match ctx.mode {
            Mode::Dark => "#000000",
            Mode::Light => "#ffffff",
        };
        paint
            .entry("text-halo-color".to_string())
            .or_insert_with(|| json!(halo));
        paint
            .entry("text-halo-width".to_string())
            .or_insert_with(|| num(HALO_WIDTH));
    }

    if ctx.slotted
        && let Some(property) = emissive_property(primitive)
    {
        paint.entry(property.to_string()).or_insert_with(|| json!(1));
    }

    paint
}

fn is_styled(action: LayerAction) -> bool {
    matches!(action, LayerAction::Color | LayerAction::Highlight)
}

fn color_value(
    template: &LayerTemplate,
    request: &LayerRequest,
    ctx: &PaintContext<'_>,
    log: &mut CorrectionLog,
) -> Option<Value> {
    let layer = request.layer_type.as_str();
    match &request.expression {
        Some(raw @ Value::Array(_)) => return Some(raw.clone()),
        Some(other) => log.push(
            Correction::new(
                CorrectionCode::MalformedExpression,
                layer,
                format!("ignored expression {}", other),
            )
            .with_hint("an expression must be a JSON array"),
        ),
        None => {}
    }

    let highlight = request.action == LayerAction::Highlight;
    let explicit = request.color.as_deref().map(normalize_color);
    let label_color = (template.drawing_primitive == DrawingPrimitive::Symbol && explicit.is_none())
        .then(|| ctx.settings.label_color.as_deref().map(normalize_color))
        .flatten();
    let effective = explicit.or(label_color).or_else(|| {
        is_styled(request.action).then(|| palette_color(template, highlight, ctx.mode).to_string())
    })?;

    if let (Some(attribute), Some(values)) = (&request.property_based, &request.property_values)
        && !values.is_empty()
    {
        let mut parts = vec![json!("match"), expression::get(attribute)];
        for (value, color) in values {
            parts.push(json!(value));
            parts.push(json!(normalize_color(color)));
        }
        parts.push(json!(effective));
        return Some(Value::Array(parts));
    }

    if request.zoom_based && is_styled(request.action) {
        let base = palette_color(template, false, ctx.mode);
        let min_zoom = request.min_zoom.unwrap_or(DEFAULT_COLOR_MIN_ZOOM);
        let mut parts = vec![
            json!("step"),
            json!(["zoom"]),
            json!(base),
            num(min_zoom),
            json!(effective),
        ];
        if let Some(max_zoom) = request.max_zoom {
            if max_zoom > min_zoom {
                parts.push(num(max_zoom));
                parts.push(json!(base));
            } else {
                tracing::debug!(layer_type = layer, min_zoom, max_zoom, "Ignoring maxZoom below minZoom");
            }
        }
        return Some(Value::Array(parts));
    }

    Some(json!(effective))
}

fn opacity_value(
    template: &LayerTemplate,
    request: &LayerRequest,
    log: &mut CorrectionLog,
) -> Value {
    let explicit = request.opacity.map(|opacity| {
        let clamped = opacity.clamp(0.0, 1.0);
        if clamped != opacity {
            log.record(
                CorrectionCode::OpacityClamped,
                &request.layer_type,
                format!("opacity {} clamped to {}", opacity, clamped),
            );
        }
        clamped
    });
    let opacity = explicit
        .unwrap_or_else(|| default_opacity(template, request.action == LayerAction::Highlight));

    let line = template.drawing_primitive == DrawingPrimitive::Line;
    match template.source_layer.as_deref() {
        Some("road") if line => expression::interpolate_linear(&[
            (5.0, 0.6 * opacity),
            (10.0, 0.85 * opacity),
            (14.0, opacity),
        ]),
        Some("admin") if line => expression::interpolate_linear(&[
            (2.0, opacity),
            (8.0, 0.8 * opacity),
            (14.0, 0.6 * opacity),
        ]),
        _ => num(opacity),
    }
}

fn width_value(
    template: &LayerTemplate,
    request: &LayerRequest,
    log: &mut CorrectionLog,
) -> Option<Value> {
    match request.width {
        Some(width) if width > 0.0 && request.zoom_based => {
            let (default_min, default_max) = DEFAULT_WIDTH_ZOOM_RANGE;
            let mut min_zoom = request.min_zoom.unwrap_or(default_min);
            let mut max_zoom = request.max_zoom.unwrap_or(default_max);
            if max_zoom <= min_zoom {
                (min_zoom, max_zoom) = (default_min, default_max);
            }
            Some(expression::interpolate_exponential(
                1.5,
                &[(min_zoom, 0.5 * width), (max_zoom, 2.0 * width)],
            ))
        }
        Some(width) if width > 0.0 => Some(expression::interpolate_linear(&[
            (5.0, 0.4 * width),
            (10.0, 0.6 * width),
            (14.0, 0.85 * width),
            (18.0, width),
        ])),
        Some(width) => {
            log.push(Correction::new(
                CorrectionCode::InvalidWidth,
                &request.layer_type,
                format!("ignored non-positive width {}", width),
            ));
            default_width(template, request)
        }
        None => default_width(template, request),
    }
}

fn default_width(template: &LayerTemplate, request: &LayerRequest) -> Option<Value> {
    let curve = expression::interpolate_linear(default_width_stops(template));
    Some(if request.action == LayerAction::Highlight {
        expression::scale_interpolate(&curve, HIGHLIGHT_WIDTH_SCALE)
    } else {
        curve
    })
}

/// Default `(zoom, width)` stops by layer type, then by source layer.
fn default_width_stops(template: &LayerTemplate) -> &'static [(f64, f64)] {
    match template.id.as_str() {
        "motorways" | "trunk_roads" => &[(5.0, 0.8), (10.0, 2.5), (14.0, 8.0), (18.0, 24.0)],
        "primary_roads" => &[(5.0, 0.6), (10.0, 1.8), (14.0, 6.0), (18.0, 18.0)],
        "secondary_roads" => &[(5.0, 0.4), (10.0, 1.2), (14.0, 4.0), (18.0, 14.0)],
        "streets" | "roads" | "bridges" | "tunnels" => {
            &[(10.0, 0.5), (14.0, 3.0), (18.0, 12.0)]
        }
        "paths" => &[(12.0, 0.5), (16.0, 1.5), (18.0, 2.5)],
        "railways" => &[(10.0, 0.75), (14.0, 1.5), (18.0, 3.0)],
        "ferries" => &[(8.0, 1.0), (14.0, 2.0)],
        "state_boundaries" => &[(3.0, 0.4), (8.0, 1.0), (14.0, 2.0)],
        _ => match template.source_layer.as_deref() {
            Some("road") => &[(10.0, 0.5), (14.0, 3.0), (18.0, 12.0)],
            Some("waterway") => &[(8.0, 0.5), (12.0, 1.5), (18.0, 6.0)],
            Some("admin") => &[(2.0, 0.5), (8.0, 1.5), (14.0, 3.0)],
            Some("aeroway") => &[(10.0, 1.0), (14.0, 8.0), (18.0, 30.0)],
            _ => &[(5.0, 0.5), (10.0, 1.0), (14.0, 2.0), (18.0, 4.0)],
        },
    }
}

/// Flat default opacity by layer type, then primitive.
fn default_opacity(template: &LayerTemplate, highlight: bool) -> f64 {
    if highlight {
        return 1.0;
    }
    match template.id.as_str() {
        "water" => 1.0,
        "landuse" => 0.7,
        "parks" | "woods" | "buildings_3d" => 0.8,
        "national_parks" => 0.5,
        "wetlands" => 0.6,
        "buildings" => 0.9,
        _ => match template.drawing_primitive {
            DrawingPrimitive::Fill | DrawingPrimitive::FillExtrusion => 0.8,
            DrawingPrimitive::Line | DrawingPrimitive::Symbol | DrawingPrimitive::Circle => 1.0,
        },
    }
}

/// Palette color for a layer: by layer type, then source layer, then primitive.
pub fn palette_color(template: &LayerTemplate, highlight: bool, mode: Mode) -> &'static str {
    let pick = |(normal, bright): (&'static str, &'static str)| if highlight { bright } else { normal };

    let by_type = match template.id.as_str() {
        "water" => Some(("#4a90d9", "#0077ff")),
        "waterways" => Some(("#5aa5e0", "#0091ff")),
        "landuse" => Some(("#d8d0c0", "#f0c060")),
        "parks" => Some(("#8fcf70", "#2ecc40")),
        "woods" => Some(("#6fae5a", "#1e9e3a")),
        "national_parks" => Some(("#a6d98c", "#3fbf3f")),
        "wetlands" => Some(("#9fd6c4", "#20b2aa")),
        "buildings" | "buildings_3d" => Some(("#c9bfb5", "#ff8c42")),
        "roads" | "streets" => Some(("#ffffff", "#ffcc00")),
        "motorways" => Some(("#e8927c", "#ff4136")),
        "trunk_roads" => Some(("#f4a261", "#ff6f3c")),
        "primary_roads" => Some(("#f6c177", "#ff9f1c")),
        "secondary_roads" => Some(("#f9e79f", "#ffd60a")),
        "paths" => Some(("#cbb89d", "#ff7f50")),
        "railways" => Some(("#9b9b9b", "#ff3d7f")),
        "ferries" => Some(("#5b9bd5", "#00bfff")),
        "bridges" => Some(("#f2f2f2", "#ffb000")),
        "tunnels" => Some(("#d6d6d6", "#ff8800")),
        "aeroways" => Some(("#c8c8d8", "#b10dc9")),
        "admin_boundaries" | "country_boundaries" | "state_boundaries" => {
            Some(("#8b8a99", "#e4007c"))
        }
        _ => None,
    };
    if let Some(colors) = by_type {
        return pick(colors);
    }

    let by_source = match template.source_layer.as_deref() {
        Some("water") | Some("waterway") => Some(("#4a90d9", "#0077ff")),
        Some("road") => Some(("#ffffff", "#ffcc00")),
        Some("landuse") | Some("landuse_overlay") => Some(("#d8d0c0", "#f0c060")),
        Some("building") => Some(("#c9bfb5", "#ff8c42")),
        Some("admin") => Some(("#8b8a99", "#e4007c")),
        _ => None,
    };
    if let Some(colors) = by_source {
        return pick(colors);
    }

    match template.drawing_primitive {
        DrawingPrimitive::Symbol => match (highlight, mode) {
            (true, _) => "#d7263d",
            (false, Mode::Light) => "#333333",
            (false, Mode::Dark) => "#e0e0e0",
        },
        DrawingPrimitive::Fill => pick(("#d0d0d0", "#ffdc00")),
        DrawingPrimitive::Line => pick(("#999999", "#ff4136")),
        DrawingPrimitive::Circle => pick(("#666666", "#ff4136")),
        DrawingPrimitive::FillExtrusion => pick(("#c9bfb5", "#ff8c42")),
    }
}
