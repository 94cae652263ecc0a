//! Risk analysis results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordinal risk classification
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    #[default]
    None,
    Moderate,
    High,
}

impl RiskTier {
    /// Classify a wind value; equality with a threshold meets it
    #[must_use]
    pub fn classify(value: f64, moderate_threshold: f64, high_threshold: f64) -> Self {
        if value >= high_threshold {
            RiskTier::High
        } else if value >= moderate_threshold {
            RiskTier::Moderate
        } else {
            RiskTier::None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::None => "none",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional aggregates attached to a risk result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAggregate {
    /// Customer estimate from the configured estimator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_customers: Option<u64>,
    /// Wells inside an unsafe cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_wells: Option<usize>,
    /// Wells inside the analysed region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_wells: Option<usize>,
}

impl RiskAggregate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.affected_customers.is_none()
            && self.affected_wells.is_none()
            && self.total_wells.is_none()
    }
}

/// Risk at one timestamp and tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub timestamp: DateTime<Utc>,
    pub tier: RiskTier,
    /// Asset ids at risk at exactly this tier
    pub asset_ids: BTreeSet<String>,
    /// Forecast cells classified at this tier
    pub cell_ids: BTreeSet<String>,
    /// Highest wind (m/s) or lowest temperature (°F) among the cells
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extreme_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<RiskAggregate>,
}

impl RiskResult {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, tier: RiskTier) -> Self {
        Self {
            timestamp,
            tier,
            asset_ids: BTreeSet::new(),
            cell_ids: BTreeSet::new(),
            extreme_value: None,
            aggregate: None,
        }
    }
}

/// What a wind analysis joined against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindAnalysisKind {
    PowerLineImpact,
    GeneralWind,
}

impl WindAnalysisKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WindAnalysisKind::PowerLineImpact => "power_line_impact",
            WindAnalysisKind::GeneralWind => "general_wind",
        }
    }
}

/// Headline numbers for a wind analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindRiskSummary {
    /// Timestamps with at least one moderate or high cell
    pub risk_events: usize,
    pub high_risk_cells: usize,
    pub moderate_risk_cells: usize,
    /// Strongest wind among risk cells, m/s
    pub max_wind: Option<f64>,
    /// Most high cells, ties broken by strongest wind
    pub highest_risk_timestamp: Option<DateTime<Utc>>,
    /// Distinct lines at risk across the window
    pub lines_at_risk: usize,
    pub message: String,
}

/// Per-cell classification kept for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedCell {
    pub cell_id: String,
    pub timestamp: DateTime<Utc>,
    pub tier: RiskTier,
    pub value: f64,
    /// 0..=100
    pub score: f64,
    pub polygon: geo::Polygon<f64>,
}

/// A power line, its buffered corridor and the worst tier it saw
#[derive(Debug, Clone, PartialEq)]
pub struct LineExposure {
    pub feature: crate::models::AssetFeature,
    pub corridor: geo::MultiPolygon<f64>,
    pub peak_tier: RiskTier,
}

/// Output of the wind-vs-power-line analysis
#[derive(Debug, Clone, PartialEq)]
pub struct WindRiskReport {
    pub kind: WindAnalysisKind,
    /// Ordered by timestamp, then tier descending
    pub results: Vec<RiskResult>,
    /// Canonical timestamps the analysis covered
    pub timestamps: Vec<DateTime<Utc>>,
    /// True when no forecast data existed for the requested window
    pub no_data: bool,
    pub cells: Vec<ClassifiedCell>,
    /// Every power line analysed; empty for area-only runs
    pub lines: Vec<LineExposure>,
    pub summary: WindRiskSummary,
}

/// Output of the unsafe-temperature analysis
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRiskReport {
    pub result: Option<RiskResult>,
    pub no_data: bool,
    /// Unsafe cells with their minimum temperature in °F
    pub cells: Vec<ClassifiedCell>,
    pub min_temp_f: f64,
    /// Wells split into affected and normal; empty when wells were not analysed
    pub affected_wells: Vec<crate::models::AssetFeature>,
    pub normal_wells: Vec<crate::models::AssetFeature>,
}
