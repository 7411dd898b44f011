//! Integration tests: whole builds over the built-in catalog.

use mapstyle_core::{
    BuildError, BuildOutput, BuildRequest, CorrectionCode, CorrectionKind, EngineConfig,
    StyleEngine,
};
use serde_json::{Value, json};

fn build(request: Value) -> BuildOutput {
    let request: BuildRequest = serde_json::from_value(request).unwrap();
    StyleEngine::builtin().build(&request).unwrap()
}

fn layer(output: &BuildOutput, id: &str) -> Value {
    serde_json::to_value(output.document.layer(id).unwrap()).unwrap()
}

#[test]
fn test_blank_water_end_to_end() {
    let output = build(json!({
        "styleName": "Blue water",
        "baseStyle": "blank",
        "layers": [{"layerType": "water", "color": "0066ff"}]
    }));

    assert_eq!(output.document.layer_ids(), vec!["background", "water"]);
    let water = layer(&output, "water");
    assert_eq!(water["paint"]["fill-color"], json!("#0066ff"));
    assert_eq!(water["source"], json!("composite"));
    assert_eq!(water["source-layer"], json!("water"));
    assert!(output.corrections.is_empty());

    let doc = serde_json::to_value(&output.document).unwrap();
    assert_eq!(doc["version"], json!(8));
    assert!(doc.get("sprite").is_none());
    assert_eq!(doc["glyphs"], json!("mapbox://fonts/mapbox/{fontstack}/{range}.pbf"));
    assert_eq!(
        doc["sources"]["composite"],
        json!({"type": "vector", "url": "mapbox://mapbox.mapbox-streets-v8"})
    );
    assert_eq!(doc["layers"][0]["paint"]["background-color"], json!("#f8f4f0"));
}

#[test]
fn test_build_is_deterministic() {
    let request = json!({
        "styleName": "Busy",
        "baseStyle": "standard",
        "layers": [
            {"layerType": "motorways", "color": "#ff0000", "width": 3},
            {"layerType": "roads", "filterProperties": {"class": "motorwy", "toll": true}},
            {"layerType": "landuse", "filterProperties": {"kind": "park"}},
            {"layerType": "city_labels", "action": "highlight"},
            {"layerType": "nonsense"}
        ],
        "slottedConfig": {"lightPreset": "night"}
    });
    let first = serde_json::to_string(&build(request.clone())).unwrap();
    let second = serde_json::to_string(&build(request)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_hidden_layers_are_dropped() {
    let output = build(json!({
        "styleName": "Hidden",
        "baseStyle": "streets-v12",
        "layers": [
            {"layerType": "water", "action": "hide"},
            {"layerType": "parks"}
        ]
    }));
    assert_eq!(output.document.layer_ids(), vec!["background", "parks"]);
}

#[test]
fn test_explicit_width_curve() {
    let output = build(json!({
        "styleName": "Wide",
        "baseStyle": "light-v11",
        "layers": [{"layerType": "streets", "width": 10}]
    }));
    assert_eq!(
        layer(&output, "streets")["paint"]["line-width"],
        json!(["interpolate", ["linear"], ["zoom"], 5, 4, 10, 6, 14, 8.5, 18, 10])
    );
}

#[test]
fn test_exact_and_case_variant_values_need_no_correction() {
    for value in ["motorway", "MOTORWAY", "Motorway"] {
        let output = build(json!({
            "styleName": "Case",
            "baseStyle": "blank",
            "layers": [{"layerType": "roads", "filterProperties": {"class": value}}]
        }));
        let roads = &output.document.layers[1];
        assert_eq!(roads.filter, Some(json!(["==", ["get", "class"], "motorway"])));
        assert!(output.corrections.is_empty(), "{}: {:?}", value, output.corrections);
    }
}

#[test]
fn test_typo_gets_exactly_one_correction() {
    let output = build(json!({
        "styleName": "Typo",
        "baseStyle": "blank",
        "layers": [{"layerType": "road", "filterProperties": {"class": "motorwy"}}]
    }));
    let road = &output.document.layers[1];
    assert_eq!(road.filter, Some(json!(["==", ["get", "class"], "motorway"])));
    assert_eq!(output.corrections.len(), 1);
    assert_eq!(output.corrections.count(CorrectionKind::Correction), 1);
}

#[test]
fn test_synonym_attribute_is_rewritten() {
    let output = build(json!({
        "styleName": "Parks",
        "baseStyle": "blank",
        "layers": [{"layerType": "landuse", "filterProperties": {"kind": "park"}}]
    }));
    let landuse = &output.document.layers[1];
    let filter = landuse.filter.as_ref().unwrap();
    assert_eq!(filter[0], json!("match"));
    assert_eq!(filter[1], json!(["get", "class"]));
    assert!(filter[2].as_array().unwrap().contains(&json!("park")));
    assert!(output.corrections.contains(CorrectionCode::AttributeRewritten));
}

#[test]
fn test_slotted_default_slots() {
    let output = build(json!({
        "styleName": "Slots",
        "baseStyle": "standard",
        "layers": [
            {"layerType": "motorways"},
            {"layerType": "motorways", "filterProperties": {"toll": true}},
            {"layerType": "water"},
            {"layerType": "place_labels"}
        ]
    }));
    let layers = &output.document.layers;
    assert_eq!(layers.len(), 4);
    assert_eq!(layers[0].slot.as_deref(), Some("middle"));
    assert_eq!(layers[1].slot.as_deref(), Some("top"));
    assert_eq!(layers[2].slot.as_deref(), Some("middle"));
    assert_eq!(layers[3].slot.as_deref(), Some("top"));

    // the toll variant keeps the template clause and gets its own id
    assert!(layers[1].id.starts_with("motorways-"));
    assert_eq!(
        layers[1].filter,
        Some(json!([
            "all",
            ["match", ["get", "class"], ["motorway", "motorway_link"], true, false],
            ["has", "toll"]
        ]))
    );
}

#[test]
fn test_slotted_skeleton() {
    let output = build(json!({
        "styleName": "Dusk",
        "baseStyle": "mapbox/standard",
        "layers": [{"layerType": "water"}],
        "slottedConfig": {"lightPreset": "dusk", "showPlaceLabels": false}
    }));
    let doc = serde_json::to_value(&output.document).unwrap();
    assert_eq!(
        doc["imports"],
        json!([{
            "id": "basemap",
            "url": "mapbox://styles/mapbox/standard",
            "config": {"lightPreset": "dusk", "showPlaceLabels": false}
        }])
    );
    assert_eq!(doc["projection"], json!({"name": "globe"}));
    assert_eq!(output.document.layer_ids(), vec!["water"]);
    assert_eq!(doc["layers"][0]["paint"]["fill-emissive-strength"], json!(1));
}

#[test]
fn test_unknown_slot_is_replaced() {
    let output = build(json!({
        "styleName": "Slots",
        "baseStyle": "standard",
        "layers": [{"layerType": "water", "slot": "sideways"}, {"layerType": "parks", "slot": "Bottom"}]
    }));
    assert_eq!(output.document.layers[0].slot.as_deref(), Some("middle"));
    assert_eq!(output.document.layers[1].slot.as_deref(), Some("bottom"));
    assert!(output.corrections.contains(CorrectionCode::SlotReplaced));
}

#[test]
fn test_slot_ignored_on_traditional_styles() {
    let output = build(json!({
        "styleName": "Slots",
        "baseStyle": "outdoors-v12",
        "layers": [{"layerType": "water", "slot": "top"}]
    }));
    assert_eq!(output.document.layers[1].slot, None);
    assert!(output.corrections.contains(CorrectionCode::SlotIgnored));
}

#[test]
fn test_satellite_skeleton() {
    let output = build(json!({
        "styleName": "Imagery",
        "baseStyle": "satellite-streets-v12",
        "layers": [{"layerType": "motorways"}]
    }));
    let doc = serde_json::to_value(&output.document).unwrap();
    assert_eq!(doc["sprite"], json!("mapbox://sprites/mapbox/satellite-streets-v12"));
    assert_eq!(
        doc["sources"]["mapbox-satellite"],
        json!({"type": "raster", "url": "mapbox://mapbox.satellite", "tileSize": 256})
    );
    assert_eq!(output.document.layer_ids(), vec!["background", "satellite", "motorways"]);
}

#[test]
fn test_dark_mode_inferred_from_base_style() {
    let output = build(json!({
        "styleName": "Night",
        "baseStyle": "navigation-night-v1",
        "layers": [{"layerType": "city_labels"}]
    }));
    let background = layer(&output, "background");
    assert_eq!(background["paint"]["background-color"], json!("#111111"));
    let labels = layer(&output, "city_labels");
    assert_eq!(labels["paint"]["text-halo-color"], json!("#000000"));
    assert_eq!(labels["paint"]["text-opacity"], json!(1));
}

#[test]
fn test_global_settings_override_mode_defaults() {
    let output = build(json!({
        "styleName": "Custom",
        "baseStyle": "dark-v11",
        "globalSettings": {"backgroundColor": "202020", "labelColor": "#EEEEEE", "mode": "light"},
        "layers": [{"layerType": "poi_labels"}]
    }));
    assert_eq!(layer(&output, "background")["paint"]["background-color"], json!("#202020"));
    let labels = layer(&output, "poi_labels");
    assert_eq!(labels["paint"]["text-color"], json!("#eeeeee"));
    assert_eq!(labels["paint"]["text-halo-color"], json!("#ffffff"));
}

#[test]
fn test_unknown_layer_is_skipped_with_warning() {
    let output = build(json!({
        "styleName": "Typo",
        "baseStyle": "blank",
        "layers": [{"layerType": "motorwys"}, {"layerType": "water"}]
    }));
    assert_eq!(output.document.layer_ids(), vec!["background", "water"]);
    let messages = output.corrections.to_strings();
    assert_eq!(messages.len(), 1);
    insta::assert_snapshot!(messages[0], @"warning [MS-1-2] motorwys: no layer template or source layer matches; layer skipped (did you mean 'motorways'?)");
}

#[test]
fn test_duplicate_layers_get_unique_ids() {
    let output = build(json!({
        "styleName": "Twice",
        "baseStyle": "blank",
        "layers": [
            {"layerType": "water", "color": "#0000ff"},
            {"layerType": "water", "color": "#00ffff", "minZoom": 10}
        ]
    }));
    assert_eq!(output.document.layer_ids(), vec!["background", "water", "water-2"]);
    assert_eq!(layer(&output, "water-2")["minzoom"], json!(10));
}

#[test]
fn test_zoom_based_layers_omit_zoom_range() {
    let output = build(json!({
        "styleName": "Zoom",
        "baseStyle": "blank",
        "layers": [{"layerType": "parks", "color": "#00aa00", "zoomBased": true, "minZoom": 10}]
    }));
    let parks = layer(&output, "parks");
    assert!(parks.get("minzoom").is_none());
    assert_eq!(
        parks["paint"]["fill-color"],
        json!(["step", ["zoom"], "#8fcf70", 10, "#00aa00"])
    );
}

#[test]
fn test_layer_order_is_preserved() {
    let output = build(json!({
        "styleName": "Order",
        "baseStyle": "streets-v12",
        "layers": [
            {"layerType": "city_labels"},
            {"layerType": "water"},
            {"layerType": "motorways"}
        ]
    }));
    assert_eq!(
        output.document.layer_ids(),
        vec!["background", "city_labels", "water", "motorways"]
    );
}

#[test]
fn test_raw_filter_passes_through() {
    let raw = json!([">=", ["get", "admin_level"], 1]);
    let output = build(json!({
        "styleName": "Raw",
        "baseStyle": "blank",
        "layers": [{"layerType": "admin_boundaries", "filter": raw}]
    }));
    assert_eq!(output.document.layers[1].filter, Some(raw));
}

#[test]
fn test_custom_config_changes_presence_attributes() {
    let config = EngineConfig::from_toml_str("presence_only_attributes = []").unwrap();
    let request: BuildRequest = serde_json::from_value(json!({
        "styleName": "Toll",
        "baseStyle": "blank",
        "layers": [{"layerType": "streets", "filterProperties": {"toll": true}}]
    }))
    .unwrap();
    let output = StyleEngine::builtin().with_config(config).build(&request).unwrap();
    let filter = output.document.layers[1].filter.as_ref().unwrap();
    assert_eq!(filter[2], json!(["==", ["get", "toll"], "true"]));
}

#[test]
fn test_request_level_errors() {
    let engine = StyleEngine::builtin();

    let mut request = BuildRequest::new("  ", "standard");
    assert_eq!(engine.build(&request).unwrap_err(), BuildError::EmptyStyleName);

    request.style_name = "Named".to_string();
    request.base_style = "streets-v11".to_string();
    let err = engine.build(&request).unwrap_err();
    assert!(err.to_string().starts_with("Unknown base style 'streets-v11'"));

    let missing: BuildRequest =
        serde_json::from_value(json!({"styleName": "No layers", "baseStyle": "blank"})).unwrap();
    assert_eq!(engine.build(&missing).unwrap_err(), BuildError::MissingLayers);
}

#[test]
fn test_output_serializes_corrections_as_strings() {
    let output = build(json!({
        "styleName": "Typo",
        "baseStyle": "blank",
        "layers": [{"layerType": "roads", "filterProperties": {"class": "motorwy"}}]
    }));
    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(
        value["corrections"],
        json!(["correction [MS-2-1] roads: class 'motorwy' corrected to 'motorway'"])
    );
    assert_eq!(value["document"]["name"], json!("Typo"));
}

#[test]
fn test_engine_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StyleEngine<'static>>();

    let engine = StyleEngine::builtin();
    let request: BuildRequest = serde_json::from_value(json!({
        "styleName": "Threads",
        "baseStyle": "blank",
        "layers": [{"layerType": "water"}]
    }))
    .unwrap();
    let outputs: Vec<BuildOutput> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.build(&request).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}
