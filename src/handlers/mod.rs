//! Built-in action handlers, one per action type

pub mod dataset;
pub mod ramp;
pub mod region;
pub mod shapes;
pub mod temperature;
pub mod view;
pub mod weather;
pub mod wind_risk;

use crate::dispatcher::ActionHandler;
use crate::models::{Layer, LayerFeature, LayerMetadata, LayerRole, LayerStyle, Region};
use serde_json::json;
use std::sync::Arc;

/// One handler for every [`crate::models::ActionType`]
#[must_use]
pub fn default_handlers() -> Vec<Arc<dyn ActionHandler>> {
    vec![
        Arc::new(weather::ShowWeatherHandler),
        Arc::new(dataset::ShowLocalDatasetHandler),
        Arc::new(wind_risk::WindRiskHandler),
        Arc::new(temperature::UnsafeTemperatureHandler),
        Arc::new(region::HighlightRegionHandler),
        Arc::new(shapes::MarkerHandler),
        Arc::new(shapes::CircleHandler),
        Arc::new(shapes::LineHandler),
        Arc::new(shapes::PolygonHandler),
        Arc::new(shapes::HeatmapHandler),
        Arc::new(view::FitBoundsHandler),
    ]
}

/// Boundary of `region` as a single-feature layer
pub(crate) fn region_layer(
    label: &str,
    region: &Region,
    source: &str,
    role: LayerRole,
    style: LayerStyle,
) -> Layer {
    let feature = LayerFeature::new(region.boundary.clone())
        .with_property("name", json!(region.label()))
        .with_property("kind", json!(region.kind.as_str()))
        .with_property("state", json!(region.state_name()))
        .with_property("fips", json!(region.fips));
    Layer::new(
        label,
        role,
        LayerMetadata::new(source).with_region(region.label()),
    )
    .with_style(style)
    .with_features(vec![feature])
}
