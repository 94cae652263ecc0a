//! Data models for the `GeoAssist` core
//!
//! This module contains the core domain models organized by concern:
//! - Action: validated map actions, one variant per action type
//! - Region: state and county boundary records
//! - Forecast: forecast points, canonical hours and time selection
//! - Asset: infrastructure features such as power lines and oil wells
//! - Risk: risk tiers and per-timestamp risk results
//! - Layer: renderer-agnostic output layers

pub mod action;
pub mod asset;
pub mod forecast;
pub mod layer;
pub mod region;
pub mod risk;

// Re-export all public types for convenient access
pub use action::{Action, ActionType, LatLon, StyleOverrides};
pub use asset::{AssetDataset, AssetFeature};
pub use forecast::{ForecastPoint, TimeSelection, TimeWindow, WeatherVariable};
pub use layer::{Layer, LayerFeature, LayerMetadata, LayerRole, LayerStyle};
pub use region::{Region, RegionKind};
pub use risk::{
    ClassifiedCell, LineExposure, RiskAggregate, RiskResult, RiskTier, TemperatureRiskReport,
    WindAnalysisKind, WindRiskReport, WindRiskSummary,
};
