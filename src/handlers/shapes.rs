//! Drawing primitives: markers, circles, lines, polygons and heatmaps
//!
//! None of these touch the datasets; they turn validated coordinates into a
//! single overlay layer with the default style merged with any overrides.

use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::{
    Action, ActionType, LatLon, Layer, LayerFeature, LayerMetadata, LayerRole, LayerStyle,
};
use async_trait::async_trait;
use geo::{Coord, LineString, Polygon};
use serde_json::json;
use tracing::debug;

pub struct MarkerHandler;
pub struct CircleHandler;
pub struct LineHandler;
pub struct PolygonHandler;
pub struct HeatmapHandler;

fn with_popup(feature: LayerFeature, popup: Option<&String>) -> LayerFeature {
    match popup {
        Some(popup) => feature.with_property("popup", json!(popup)),
        None => feature,
    }
}

fn overlay(
    label: &str,
    action_type: ActionType,
    style: LayerStyle,
    feature: LayerFeature,
) -> Layer {
    Layer::new(
        label,
        LayerRole::Overlay,
        LayerMetadata::new(action_type.as_str()),
    )
    .with_style(style)
    .with_features(vec![feature])
}

fn coords(locations: &[LatLon]) -> Vec<Coord<f64>> {
    locations.iter().map(|l| l.to_coord()).collect()
}

#[async_trait]
impl ActionHandler for MarkerHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AddMarker
    }

    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::AddMarker(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let feature = with_popup(
            LayerFeature::new(params.location.to_point()),
            params.popup.as_ref(),
        );
        let style = params.style.apply(LayerStyle {
            color: Some("blue".to_string()),
            ..LayerStyle::default()
        });
        Ok(vec![overlay("Marker", self.action_type(), style, feature)])
    }
}

#[async_trait]
impl ActionHandler for CircleHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AddCircle
    }

    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::AddCircle(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let feature = with_popup(
            LayerFeature::new(params.location.to_point())
                .with_property("radius_m", json!(params.radius)),
            params.popup.as_ref(),
        );
        let style = params.style.apply(LayerStyle {
            color: Some("blue".to_string()),
            radius: Some(params.radius),
            ..LayerStyle::default()
        });
        Ok(vec![overlay("Circle", self.action_type(), style, feature)])
    }
}

#[async_trait]
impl ActionHandler for LineHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AddLine
    }

    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::AddLine(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let feature = with_popup(
            LayerFeature::new(LineString::new(coords(&params.locations))),
            params.popup.as_ref(),
        );
        let style = params.style.apply(LayerStyle {
            dash_array: params.dash_array.clone(),
            ..LayerStyle::stroke("blue", 3.0).with_opacity(1.0)
        });
        Ok(vec![overlay("Line", self.action_type(), style, feature)])
    }
}

#[async_trait]
impl ActionHandler for PolygonHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AddPolygon
    }

    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::AddPolygon(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        // Polygon::new closes the ring
        let polygon = Polygon::new(LineString::new(coords(&params.locations)), vec![]);
        let feature = with_popup(LayerFeature::new(polygon), params.popup.as_ref());
        let style = params.style.apply(LayerStyle::area("blue", "blue", 2.0, 0.2));
        Ok(vec![overlay("Polygon", self.action_type(), style, feature)])
    }
}

#[async_trait]
impl ActionHandler for HeatmapHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AddHeatmap
    }

    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::AddHeatmap(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let features: Vec<LayerFeature> = params
            .points
            .iter()
            .map(|p| {
                LayerFeature::new(p.location.to_point())
                    .with_property("intensity", json!(p.intensity))
            })
            .collect();
        debug!("add_heatmap: {} points", features.len());
        let style = LayerStyle {
            radius: Some(params.radius),
            blur: Some(params.blur),
            ..LayerStyle::default()
        };
        Ok(vec![
            Layer::new(
                "Heatmap",
                LayerRole::Overlay,
                LayerMetadata::new(self.action_type().as_str())
                    .with_property("point_count", json!(features.len())),
            )
            .with_style(style)
            .with_features(features),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StaticDatasets;
    use crate::handlers::testing;
    use crate::models::StyleOverrides;
    use crate::models::action::{AddCircle, AddHeatmap, AddLine, AddMarker, AddPolygon, HeatPoint};
    use geo::Geometry;

    fn at(lat: f64, lon: f64) -> LatLon {
        LatLon { lat, lon }
    }

    fn ctx() -> HandlerContext {
        testing::context(StaticDatasets::new())
    }

    #[tokio::test]
    async fn test_marker_with_popup_and_color_override() {
        let action = Action::AddMarker(AddMarker {
            location: at(41.9, -87.6),
            popup: Some("Chicago".to_string()),
            style: StyleOverrides {
                color: Some("red".to_string()),
                ..StyleOverrides::default()
            },
        });
        let layers = MarkerHandler.handle(&action, &ctx()).await.unwrap();
        let feature = &layers[0].features[0];
        assert_eq!(feature.geometry, Geometry::Point(geo::Point::new(-87.6, 41.9)));
        assert_eq!(feature.properties["popup"], json!("Chicago"));
        assert_eq!(layers[0].style.color.as_deref(), Some("red"));
        assert_eq!(layers[0].metadata.source, "add_marker");
    }

    #[tokio::test]
    async fn test_circle_radius_in_style() {
        let action = Action::AddCircle(AddCircle {
            location: at(40.0, -75.0),
            radius: 1000.0,
            popup: None,
            style: StyleOverrides::default(),
        });
        let layers = CircleHandler.handle(&action, &ctx()).await.unwrap();
        assert_eq!(layers[0].style.radius, Some(1000.0));
        assert!(!layers[0].features[0].properties.contains_key("popup"));
    }

    #[tokio::test]
    async fn test_line_defaults_and_dash() {
        let action = Action::AddLine(AddLine {
            locations: vec![at(40.0, -75.0), at(41.0, -76.0)],
            popup: None,
            dash_array: Some("5, 10".to_string()),
            style: StyleOverrides::default(),
        });
        let layers = LineHandler.handle(&action, &ctx()).await.unwrap();
        let style = &layers[0].style;
        assert_eq!(style.color.as_deref(), Some("blue"));
        assert_eq!(style.weight, Some(3.0));
        assert_eq!(style.opacity, Some(1.0));
        assert_eq!(style.dash_array.as_deref(), Some("5, 10"));
    }

    #[tokio::test]
    async fn test_polygon_ring_is_closed() {
        let action = Action::AddPolygon(AddPolygon {
            locations: vec![at(40.0, -75.0), at(41.0, -75.0), at(41.0, -76.0)],
            popup: None,
            style: StyleOverrides::default(),
        });
        let layers = PolygonHandler.handle(&action, &ctx()).await.unwrap();
        let Geometry::Polygon(polygon) = &layers[0].features[0].geometry else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.exterior().0.len(), 4);
        assert_eq!(layers[0].style.fill_opacity, Some(0.2));
    }

    #[tokio::test]
    async fn test_heatmap_points_keep_intensity() {
        let action = Action::AddHeatmap(AddHeatmap {
            points: vec![
                HeatPoint {
                    location: at(40.0, -75.0),
                    intensity: 1.0,
                },
                HeatPoint {
                    location: at(40.1, -75.1),
                    intensity: 3.5,
                },
            ],
            radius: 15.0,
            blur: 10.0,
        });
        let layers = HeatmapHandler.handle(&action, &ctx()).await.unwrap();
        assert_eq!(layers[0].features.len(), 2);
        assert_eq!(layers[0].features[1].properties["intensity"], json!(3.5));
        assert_eq!(layers[0].style.blur, Some(10.0));
    }
}
