//! Build request types.
//!
//! A [`BuildRequest`] is the whole input of a build: a style name, a base
//! style, and an ordered list of [`LayerRequest`]s describing what each layer
//! should look like in abstract terms.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BuildError;

/// What to do with a requested layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerAction {
    #[default]
    Color,
    Highlight,
    Hide,
    Show,
}

/// One "what should this layer look like" instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRequest {
    /// Abstract layer type ("motorways") or source layer name ("road")
    pub layer_type: String,
    #[serde(default)]
    pub action: LayerAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Raw expression array or flat attribute object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_properties: Option<IndexMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default)]
    pub zoom_based: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    /// Attribute whose value selects the color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_based: Option<String>,
    /// Attribute value to color, used with `property_based`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_values: Option<IndexMap<String, String>>,
    /// Raw expression overriding the computed color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Value>,
}

impl LayerRequest {
    pub fn new(layer_type: impl Into<String>, action: LayerAction) -> Self {
        Self {
            layer_type: layer_type.into(),
            action,
            ..Default::default()
        }
    }

    /// Whether the caller constrained features by attribute, either through
    /// `filter_properties` or a flat-object `filter`.
    pub fn has_filter_properties(&self) -> bool {
        let explicit = self
            .filter_properties
            .as_ref()
            .is_some_and(|props| !props.is_empty());
        let flat = matches!(&self.filter, Some(Value::Object(map)) if !map.is_empty());
        explicit || flat
    }

    /// Whether any request-level filter was supplied.
    pub fn has_filter(&self) -> bool {
        self.has_filter_properties() || matches!(self.filter, Some(Value::Array(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Light,
    Dark,
}

/// Style-wide appearance settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,
    /// Inferred from the base style when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

/// Configuration handed to the imported basemap of a slotted style.
///
/// The named keys are the common Standard style options; anything else is
/// passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlottedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_place_labels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_road_labels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_point_of_interest_labels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_transit_labels: Option<bool>,
    #[serde(
        default,
        rename = "show3dObjects",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_3d_objects: Option<bool>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl SlottedConfig {
    /// The config as an ordered JSON object.
    pub fn to_map(&self) -> IndexMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => IndexMap::new(),
        }
    }
}

/// The whole input of a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub style_name: String,
    #[serde(default = "default_base_style")]
    pub base_style: String,
    /// Absent is an error; an empty list builds an empty style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerRequest>>,
    #[serde(default)]
    pub global_settings: GlobalSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slotted_config: Option<SlottedConfig>,
}

fn default_base_style() -> String {
    BaseStyle::Standard.name().to_string()
}

impl BuildRequest {
    pub fn new(style_name: impl Into<String>, base_style: impl Into<String>) -> Self {
        Self {
            style_name: style_name.into(),
            base_style: base_style.into(),
            layers: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn with_layer(mut self, layer: LayerRequest) -> Self {
        self.layers.get_or_insert_with(Vec::new).push(layer);
        self
    }
}

/// How a base style wires its document together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skeleton {
    /// Imports the basemap and places custom layers into slots
    Slotted,
    /// Composite vector source with sprite and glyphs
    Traditional,
    /// Composite vector source with glyphs only
    Blank,
}

/// Supported base styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseStyle {
    Standard,
    StandardSatellite,
    StreetsV12,
    OutdoorsV12,
    LightV11,
    DarkV11,
    SatelliteV9,
    SatelliteStreetsV12,
    NavigationDayV1,
    NavigationNightV1,
    Blank,
}

impl BaseStyle {
    pub fn name(&self) -> &'static str {
        match self {
            BaseStyle::Standard => "standard",
            BaseStyle::StandardSatellite => "standard-satellite",
            BaseStyle::StreetsV12 => "streets-v12",
            BaseStyle::OutdoorsV12 => "outdoors-v12",
            BaseStyle::LightV11 => "light-v11",
            BaseStyle::DarkV11 => "dark-v11",
            BaseStyle::SatelliteV9 => "satellite-v9",
            BaseStyle::SatelliteStreetsV12 => "satellite-streets-v12",
            BaseStyle::NavigationDayV1 => "navigation-day-v1",
            BaseStyle::NavigationNightV1 => "navigation-night-v1",
            BaseStyle::Blank => "blank",
        }
    }

    pub fn all() -> &'static [BaseStyle] {
        &[
            BaseStyle::Standard,
            BaseStyle::StandardSatellite,
            BaseStyle::StreetsV12,
            BaseStyle::OutdoorsV12,
            BaseStyle::LightV11,
            BaseStyle::DarkV11,
            BaseStyle::SatelliteV9,
            BaseStyle::SatelliteStreetsV12,
            BaseStyle::NavigationDayV1,
            BaseStyle::NavigationNightV1,
            BaseStyle::Blank,
        ]
    }

    pub fn skeleton(&self) -> Skeleton {
        match self {
            BaseStyle::Standard | BaseStyle::StandardSatellite => Skeleton::Slotted,
            BaseStyle::Blank => Skeleton::Blank,
            _ => Skeleton::Traditional,
        }
    }

    pub fn is_slotted(&self) -> bool {
        self.skeleton() == Skeleton::Slotted
    }

    /// Traditional styles that need a satellite raster underlay.
    pub fn has_satellite_imagery(&self) -> bool {
        matches!(self, BaseStyle::SatelliteV9 | BaseStyle::SatelliteStreetsV12)
    }

    /// Mode assumed when the request doesn't set one.
    pub fn default_mode(&self) -> Mode {
        match self {
            BaseStyle::DarkV11 | BaseStyle::NavigationNightV1 => Mode::Dark,
            _ => Mode::Light,
        }
    }

    /// `mapbox://styles/mapbox/<name>`
    pub fn url(&self) -> String {
        format!("mapbox://styles/mapbox/{}", self.name())
    }
}

impl std::fmt::Display for BaseStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseStyle {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix("mapbox/").unwrap_or(trimmed).to_lowercase();
        BaseStyle::all()
            .iter()
            .copied()
            .find(|base| base.name() == name)
            .ok_or_else(|| BuildError::UnknownBaseStyle {
                name: s.to_string(),
                expected: BaseStyle::all()
                    .iter()
                    .map(BaseStyle::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
