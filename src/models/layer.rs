//! Renderer-agnostic map layers

use chrono::{DateTime, Utc};
use geo::Geometry;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Draw order class of a layer; lower roles draw first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    /// Region highlights and analysis outlines
    Base,
    /// Weather fields, datasets, drawing primitives
    Overlay,
    /// Risk highlighting, drawn on top
    Risk,
    /// Viewport hints such as explicit bounds
    Viewport,
}

/// Style attributes understood by any map renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    /// Marker/circle radius in metres, heatmap radius in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl LayerStyle {
    #[must_use]
    pub fn stroke(color: &str, weight: f64) -> Self {
        Self {
            color: Some(color.to_string()),
            weight: Some(weight),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn area(color: &str, fill_color: &str, weight: f64, fill_opacity: f64) -> Self {
        Self {
            color: Some(color.to_string()),
            fill_color: Some(fill_color.to_string()),
            weight: Some(weight),
            fill_opacity: Some(fill_opacity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// One geometry with its display properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerFeature {
    #[serde(serialize_with = "serialize_geometry")]
    pub geometry: Geometry<f64>,
    pub properties: BTreeMap<String, Value>,
}

impl LayerFeature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

fn serialize_geometry<S: Serializer>(geometry: &Geometry<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    crate::geojson::geometry_to_value(geometry).serialize(serializer)
}

/// Legend and tooltip context carried by every layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerMetadata {
    /// Dataset or action the layer was derived from
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Set when the requested window had no forecast data
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_data: bool,
    /// Human-readable note for the caller, e.g. a capability demotion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl LayerMetadata {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_property<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Output unit handed to the map renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub label: String,
    pub role: LayerRole,
    pub features: Vec<LayerFeature>,
    pub style: LayerStyle,
    pub metadata: LayerMetadata,
}

impl Layer {
    pub fn new<S: Into<String>>(label: S, role: LayerRole, metadata: LayerMetadata) -> Self {
        Self {
            label: label.into(),
            role,
            features: Vec::new(),
            style: LayerStyle::default(),
            metadata,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: Vec<LayerFeature>) -> Self {
        self.features = features;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Render as a GeoJSON FeatureCollection with style and metadata as foreign members
    #[must_use]
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .features
            .iter()
            .map(|feature| {
                let properties: Map<String, Value> = feature
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                json!({
                    "type": "Feature",
                    "geometry": crate::geojson::geometry_to_value(&feature.geometry),
                    "properties": properties,
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "name": self.label,
            "style": self.style,
            "metadata": self.metadata,
            "features": features,
        })
    }
}
