//! Normalized map actions
//!
//! Every action type is its own variant carrying only the fields it uses.
//! Values are produced by [`crate::normalizer`] and never mutated afterwards.

use crate::models::{AssetDataset, LayerStyle, RegionKind, TimeSelection, WeatherVariable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported `action_type` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ShowWeather,
    ShowLocalDataset,
    AnalyzeWindRisk,
    UnsafeTemperature,
    HighlightRegion,
    AddMarker,
    AddCircle,
    AddLine,
    AddPolygon,
    AddHeatmap,
    FitBounds,
}

impl ActionType {
    pub const ALL: [ActionType; 11] = [
        ActionType::ShowWeather,
        ActionType::ShowLocalDataset,
        ActionType::AnalyzeWindRisk,
        ActionType::UnsafeTemperature,
        ActionType::HighlightRegion,
        ActionType::AddMarker,
        ActionType::AddCircle,
        ActionType::AddLine,
        ActionType::AddPolygon,
        ActionType::AddHeatmap,
        ActionType::FitBounds,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ShowWeather => "show_weather",
            ActionType::ShowLocalDataset => "show_local_dataset",
            ActionType::AnalyzeWindRisk => "analyze_wind_risk",
            ActionType::UnsafeTemperature => "unsafe_temperature",
            ActionType::HighlightRegion => "highlight_region",
            ActionType::AddMarker => "add_marker",
            ActionType::AddCircle => "add_circle",
            ActionType::AddLine => "add_line",
            ActionType::AddPolygon => "add_polygon",
            ActionType::AddHeatmap => "add_heatmap",
            ActionType::FitBounds => "fit_bounds",
        }
    }

    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == text)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style passthrough fields; unset fields keep the handler's defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverrides {
    pub color: Option<String>,
    pub fill_color: Option<String>,
    pub weight: Option<f64>,
    pub opacity: Option<f64>,
    pub fill_opacity: Option<f64>,
}

impl StyleOverrides {
    #[must_use]
    pub fn apply(&self, mut base: LayerStyle) -> LayerStyle {
        if let Some(color) = &self.color {
            base.color = Some(color.clone());
        }
        if let Some(fill_color) = &self.fill_color {
            base.fill_color = Some(fill_color.clone());
        }
        if self.weight.is_some() {
            base.weight = self.weight;
        }
        if self.opacity.is_some() {
            base.opacity = self.opacity;
        }
        if self.fill_opacity.is_some() {
            base.fill_opacity = self.fill_opacity;
        }
        base
    }
}

/// Latitude/longitude pair as the actions spell it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }

    #[must_use]
    pub fn to_coord(self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowWeather {
    pub parameter: WeatherVariable,
    pub time: TimeSelection,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowLocalDataset {
    pub dataset: AssetDataset,
    pub region: Option<String>,
    pub style: StyleOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeWindRisk {
    pub region: String,
    /// Unset means the configured default horizon
    pub forecast_days: Option<u32>,
    /// m/s
    pub high_threshold: f64,
    /// m/s
    pub moderate_threshold: f64,
    pub analyze_power_lines: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsafeTemperature {
    pub region: String,
    pub min_temp_f: f64,
    /// Already demoted to false outside the oil-well region
    pub show_oil_wells: bool,
    /// True when wells were requested but are unavailable for the region
    pub oil_wells_demoted: bool,
    pub time: TimeSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRegion {
    pub region: String,
    pub region_type: Option<RegionKind>,
    pub style: StyleOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMarker {
    pub location: LatLon,
    pub popup: Option<String>,
    pub style: StyleOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddCircle {
    pub location: LatLon,
    /// Metres
    pub radius: f64,
    pub popup: Option<String>,
    pub style: StyleOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLine {
    pub locations: Vec<LatLon>,
    pub popup: Option<String>,
    pub dash_array: Option<String>,
    pub style: StyleOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPolygon {
    pub locations: Vec<LatLon>,
    pub popup: Option<String>,
    pub style: StyleOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub location: LatLon,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddHeatmap {
    pub points: Vec<HeatPoint>,
    pub radius: f64,
    pub blur: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitBounds {
    pub south_west: LatLon,
    pub north_east: LatLon,
}

/// A validated action, one variant per action type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    ShowWeather(ShowWeather),
    ShowLocalDataset(ShowLocalDataset),
    AnalyzeWindRisk(AnalyzeWindRisk),
    UnsafeTemperature(UnsafeTemperature),
    HighlightRegion(HighlightRegion),
    AddMarker(AddMarker),
    AddCircle(AddCircle),
    AddLine(AddLine),
    AddPolygon(AddPolygon),
    AddHeatmap(AddHeatmap),
    FitBounds(FitBounds),
}

impl Action {
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::ShowWeather(_) => ActionType::ShowWeather,
            Action::ShowLocalDataset(_) => ActionType::ShowLocalDataset,
            Action::AnalyzeWindRisk(_) => ActionType::AnalyzeWindRisk,
            Action::UnsafeTemperature(_) => ActionType::UnsafeTemperature,
            Action::HighlightRegion(_) => ActionType::HighlightRegion,
            Action::AddMarker(_) => ActionType::AddMarker,
            Action::AddCircle(_) => ActionType::AddCircle,
            Action::AddLine(_) => ActionType::AddLine,
            Action::AddPolygon(_) => ActionType::AddPolygon,
            Action::AddHeatmap(_) => ActionType::AddHeatmap,
            Action::FitBounds(_) => ActionType::FitBounds,
        }
    }

    /// Region text the action is scoped to, if any
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        match self {
            Action::ShowWeather(a) => a.region.as_deref(),
            Action::ShowLocalDataset(a) => a.region.as_deref(),
            Action::AnalyzeWindRisk(a) => Some(&a.region),
            Action::UnsafeTemperature(a) => Some(&a.region),
            Action::HighlightRegion(a) => Some(&a.region),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_round_trips_all_names() {
        for action_type in ActionType::ALL {
            assert_eq!(ActionType::parse(action_type.as_str()), Some(action_type));
        }
        assert_eq!(ActionType::parse("draw_unicorn"), None);
    }

    #[test]
    fn test_style_overrides_apply() {
        let base = LayerStyle::area("#0066cc", "#ffff00", 4.0, 0.5);
        let overrides = StyleOverrides {
            color: Some("red".into()),
            weight: Some(6.0),
            ..StyleOverrides::default()
        };
        let style = overrides.apply(base);
        assert_eq!(style.color.as_deref(), Some("red"));
        assert_eq!(style.fill_color.as_deref(), Some("#ffff00"));
        assert_eq!(style.weight, Some(6.0));
        assert_eq!(style.fill_opacity, Some(0.5));
    }

    #[test]
    fn test_action_reports_type_and_region() {
        let action = Action::AnalyzeWindRisk(AnalyzeWindRisk {
            region: "Illinois".into(),
            forecast_days: None,
            high_threshold: 15.0,
            moderate_threshold: 9.0,
            analyze_power_lines: true,
        });
        assert_eq!(action.action_type(), ActionType::AnalyzeWindRisk);
        assert_eq!(action.region(), Some("Illinois"));
    }
}
