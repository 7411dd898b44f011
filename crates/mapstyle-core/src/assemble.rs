//! Style assembly.
//!
//! [`StyleEngine::build`] drives a whole build: it picks the skeleton for the
//! base style, runs every layer request through resolution, filter compilation
//! and paint/layout synthesis, and appends the results in request order.

use std::collections::HashMap;
use std::str::FromStr;

use indexmap::IndexMap;
use mapstyle_catalog::{
    AttributeCatalog, DrawingPrimitive, LayerTemplate, TemplateRegistry, builtin_templates,
    streets_v8,
};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{EngineConfig, SLOTS};
use crate::corrections::{Correction, CorrectionCode, CorrectionLog};
use crate::document::{LayerKind, Projection, SourceSpec, StyleDocument, StyleImport, StyleLayer};
use crate::error::{BuildError, ResolveError};
use crate::expression::num;
use crate::filter::FilterCompiler;
use crate::layout::synthesize_layout;
use crate::paint::{PaintContext, normalize_color, synthesize_paint};
use crate::request::{BaseStyle, BuildRequest, LayerAction, LayerRequest, Mode, Skeleton};
use crate::resolve::LayerResolver;

/// Id of the vector source every custom layer draws from.
pub const COMPOSITE_SOURCE: &str = "composite";
const SATELLITE_SOURCE: &str = "mapbox-satellite";
const SATELLITE_URL: &str = "mapbox://mapbox.satellite";
const GLYPHS_URL: &str = "mapbox://fonts/mapbox/{fontstack}/{range}.pbf";
const BASEMAP_IMPORT_ID: &str = "basemap";

const LIGHT_BACKGROUND: &str = "#f8f4f0";
const DARK_BACKGROUND: &str = "#111111";

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutput {
    pub document: StyleDocument,
    pub corrections: CorrectionLog,
}

/// The style builder.
///
/// Borrows an immutable catalog and template registry, so one engine can serve
/// concurrent builds.
#[derive(Debug, Clone)]
pub struct StyleEngine<'a> {
    catalog: &'a AttributeCatalog,
    templates: &'a TemplateRegistry,
    config: EngineConfig,
}

impl StyleEngine<'static> {
    /// Engine over the built-in Streets v8 catalog and template registry.
    pub fn builtin() -> Self {
        Self::new(streets_v8(), builtin_templates())
    }
}

impl<'a> StyleEngine<'a> {
    pub fn new(catalog: &'a AttributeCatalog, templates: &'a TemplateRegistry) -> Self {
        Self {
            catalog,
            templates,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'a AttributeCatalog {
        self.catalog
    }

    pub fn templates(&self) -> &'a TemplateRegistry {
        self.templates
    }

    /// Build a style document.
    ///
    /// Only a malformed request as a whole fails; problems with individual
    /// layers are recorded in the returned correction log.
    pub fn build(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError> {
        let name = request.style_name.trim();
        if name.is_empty() {
            return Err(BuildError::EmptyStyleName);
        }
        let base = BaseStyle::from_str(&request.base_style)?;
        let layers = request.layers.as_ref().ok_or(BuildError::MissingLayers)?;
        let mode = request
            .global_settings
            .mode
            .unwrap_or_else(|| base.default_mode());

        let mut log = CorrectionLog::new();
        let mut document = self.skeleton(name, base, request);
        let mut ids = LayerIds::default();

        if !base.is_slotted() {
            let color = request
                .global_settings
                .background_color
                .as_deref()
                .map(normalize_color)
                .unwrap_or_else(|| default_background(mode).to_string());
            let background = StyleLayer::background(&color);
            ids.claim(&background.id);
            document.layers.push(background);
        }
        if base.has_satellite_imagery() {
            let mut satellite = StyleLayer::new("satellite", LayerKind::Raster);
            satellite.source = Some(SATELLITE_SOURCE.to_string());
            ids.claim(&satellite.id);
            document.layers.push(satellite);
        }

        let resolver = LayerResolver::new(self.catalog, self.templates);
        let compiler = FilterCompiler::new(self.catalog, &self.config);
        let ctx = PaintContext {
            settings: &request.global_settings,
            mode,
            slotted: base.is_slotted(),
        };

        let mut skipped = 0;
        for layer_request in layers {
            if layer_request.action == LayerAction::Hide {
                tracing::debug!(layer_type = %layer_request.layer_type, "Dropping hidden layer");
                skipped += 1;
                continue;
            }

            let filter_props = filter_properties(layer_request);
            let template = match resolver.resolve(
                &layer_request.layer_type,
                filter_props.as_ref(),
                &mut log,
            ) {
                Ok(template) => template,
                Err(err) => {
                    log.push(not_found(&err, &layer_request.layer_type));
                    skipped += 1;
                    continue;
                }
            };

            let filter = compiler.compile(&template, layer_request, &mut log);
            let mut layer = StyleLayer::new(
                ids.assign(layer_id(&template, layer_request, filter.as_ref())),
                template.drawing_primitive.into(),
            );
            if let Some(source_layer) = &template.source_layer {
                layer.source = Some(COMPOSITE_SOURCE.to_string());
                layer.source_layer = Some(source_layer.clone());
            }
            layer.slot = self.slot(base, &template, layer_request, &mut log);
            layer.filter = filter;
            if !layer_request.zoom_based {
                layer.minzoom = layer_request.min_zoom.map(num);
                layer.maxzoom = layer_request.max_zoom.map(num);
            }
            layer.layout = synthesize_layout(&template, layer_request);
            layer.paint = synthesize_paint(&template, layer_request, &ctx, &mut log);

            tracing::debug!(
                layer_type = %layer_request.layer_type,
                id = %layer.id,
                template = %template.id,
                "Synthesized layer"
            );
            document.layers.push(layer);
        }

        tracing::info!(
            style = name,
            base = base.name(),
            layers = document.layers.len(),
            skipped,
            corrections = log.len(),
            "Built style"
        );

        Ok(BuildOutput {
            document,
            corrections: log,
        })
    }

    fn skeleton(&self, name: &str, base: BaseStyle, request: &BuildRequest) -> StyleDocument {
        let mut document = StyleDocument::new(name);
        document.sources.insert(
            COMPOSITE_SOURCE.to_string(),
            SourceSpec::Vector {
                url: format!("mapbox://{}", self.catalog.id),
            },
        );

        match base.skeleton() {
            Skeleton::Slotted => {
                let config = request
                    .slotted_config
                    .as_ref()
                    .map(|config| config.to_map())
                    .unwrap_or_default();
                document.imports.push(StyleImport {
                    id: BASEMAP_IMPORT_ID.to_string(),
                    url: base.url(),
                    config,
                });
                document.projection = Some(Projection {
                    name: "globe".to_string(),
                });
            }
            Skeleton::Traditional => {
                document.sprite = Some(format!("mapbox://sprites/mapbox/{}", base.name()));
                document.glyphs = Some(GLYPHS_URL.to_string());
                if base.has_satellite_imagery() {
                    document.sources.insert(
                        SATELLITE_SOURCE.to_string(),
                        SourceSpec::Raster {
                            url: SATELLITE_URL.to_string(),
                            tile_size: 256,
                        },
                    );
                }
            }
            Skeleton::Blank => {
                document.glyphs = Some(GLYPHS_URL.to_string());
            }
        }

        if request.slotted_config.is_some() && !base.is_slotted() {
            tracing::debug!(base = base.name(), "Ignoring slotted config for a non-slotted base style");
        }
        document
    }

    /// Slot for a custom layer; `None` outside slotted styles.
    fn slot(
        &self,
        base: BaseStyle,
        template: &LayerTemplate,
        request: &LayerRequest,
        log: &mut CorrectionLog,
    ) -> Option<String> {
        let layer = request.layer_type.as_str();
        if !base.is_slotted() {
            if let Some(slot) = &request.slot {
                log.record(
                    CorrectionCode::SlotIgnored,
                    layer,
                    format!("slot '{}' ignored: base style '{}' has no slots", slot, base),
                );
            }
            return None;
        }

        if let Some(slot) = &request.slot {
            let normalized = slot.trim().to_lowercase();
            if SLOTS.contains(&normalized.as_str()) {
                return Some(normalized);
            }
            let fallback = self.default_slot(template, request);
            log.push(
                Correction::new(
                    CorrectionCode::SlotReplaced,
                    layer,
                    format!("unknown slot '{}' replaced with '{}'", slot, fallback),
                )
                .with_hint(format!("slots are {}", SLOTS.join(", "))),
            );
            return Some(fallback.to_string());
        }

        Some(self.default_slot(template, request).to_string())
    }

    fn default_slot<'s>(&'s self, template: &LayerTemplate, request: &LayerRequest) -> &'s str {
        if request.has_filter_properties() || template.drawing_primitive == DrawingPrimitive::Symbol {
            "top"
        } else if template.source_layer.as_deref() == Some("road") {
            "middle"
        } else {
            &self.config.default_slot
        }
    }
}

fn default_background(mode: Mode) -> &'static str {
    match mode {
        Mode::Light => LIGHT_BACKGROUND,
        Mode::Dark => DARK_BACKGROUND,
    }
}

/// Filter properties usable for layer resolution.
fn filter_properties(request: &LayerRequest) -> Option<IndexMap<String, Value>> {
    let mut props: IndexMap<String, Value> = IndexMap::new();
    if let Some(Value::Object(map)) = &request.filter {
        props.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(explicit) = &request.filter_properties {
        props.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    (!props.is_empty()).then_some(props)
}

fn not_found(err: &ResolveError, layer_type: &str) -> Correction {
    let entry = Correction::new(
        CorrectionCode::LayerNotFound,
        layer_type,
        "no layer template or source layer matches; layer skipped",
    );
    match err.suggestions() {
        [] => entry,
        [only] => entry.with_hint(format!("did you mean '{}'?", only)),
        many => entry.with_hint(format!("did you mean one of: {}?", many.join(", "))),
    }
}

/// Deterministic layer id: the template id, plus a short digest of the
/// compiled filter when the request supplied its own filter.
fn layer_id(template: &LayerTemplate, request: &LayerRequest, filter: Option<&Value>) -> String {
    match filter {
        Some(filter) if request.has_filter() => {
            let digest = Sha256::digest(filter.to_string().as_bytes());
            let hex = format!("{:x}", digest);
            format!("{}-{}", template.id, &hex[..8])
        }
        _ => template.id.clone(),
    }
}

/// Ids handed out so far in one document.
#[derive(Debug, Default)]
struct LayerIds {
    seen: HashMap<String, usize>,
}

impl LayerIds {
    fn claim(&mut self, id: &str) {
        self.seen.insert(id.to_string(), 1);
    }

    /// Return `id`, or `id-2`, `id-3`... if it is already taken.
    fn assign(&mut self, id: String) -> String {
        let count = self.seen.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return id;
        }
        let mut n = *count;
        loop {
            let candidate = format!("{}-{}", id, n);
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(candidate.clone(), 1);
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_ids_are_suffixed() {
        let mut ids = LayerIds::default();
        ids.claim("background");
        assert_eq!(ids.assign("water".to_string()), "water");
        assert_eq!(ids.assign("water".to_string()), "water-2");
        assert_eq!(ids.assign("water".to_string()), "water-3");
        assert_eq!(ids.assign("background".to_string()), "background-2");
    }

    #[test]
    fn test_suffix_skips_taken_ids() {
        let mut ids = LayerIds::default();
        assert_eq!(ids.assign("roads-2".to_string()), "roads-2");
        assert_eq!(ids.assign("roads".to_string()), "roads");
        assert_eq!(ids.assign("roads".to_string()), "roads-3");
    }

    #[test]
    fn test_filter_digest_in_id() {
        let template = builtin_templates().get("roads").unwrap();
        let request: LayerRequest = serde_json::from_value(
            serde_json::json!({"layerType": "roads", "filterProperties": {"class": "street"}}),
        )
        .unwrap();
        let filter = serde_json::json!(["==", ["get", "class"], "street"]);
        let id = layer_id(template, &request, Some(&filter));
        assert!(id.starts_with("roads-"));
        assert_eq!(id.len(), "roads-".len() + 8);
        assert_eq!(id, layer_id(template, &request, Some(&filter)));

        let plain = LayerRequest::new("roads", LayerAction::Color);
        assert_eq!(layer_id(template, &plain, Some(&filter)), "roads");
    }

    #[test]
    fn test_engine_over_custom_registry() {
        let registry = TemplateRegistry::from_templates(vec![LayerTemplate::new(
            "lakes",
            DrawingPrimitive::Fill,
            Some("water".to_string()),
        )]);
        let engine = StyleEngine::new(streets_v8(), &registry);
        assert!(engine.templates().contains("lakes"));
        assert!(!engine.templates().contains("water"));
        assert!(engine.catalog().source_layer("water").is_some());
        assert_eq!(engine.config(), &EngineConfig::default());

        let request: BuildRequest = serde_json::from_value(serde_json::json!({
            "styleName": "Lakes",
            "baseStyle": "blank",
            "layers": [{"layerType": "lakes", "color": "#0066ff"}]
        }))
        .unwrap();
        let output = engine.build(&request).unwrap();
        let lakes = output.document.layer("lakes").unwrap();
        assert_eq!(lakes.source_layer.as_deref(), Some("water"));
        assert_eq!(lakes.paint["fill-color"], serde_json::json!("#0066ff"));
    }

    #[test]
    fn test_default_background_by_mode() {
        assert_eq!(default_background(Mode::Light), "#f8f4f0");
        assert_eq!(default_background(Mode::Dark), "#111111");
    }
}
