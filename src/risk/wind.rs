//! Wind risk classification and the power line join

use super::customers::CustomerEstimator;
use super::corridor::CorridorIndex;
use crate::models::{
    AssetFeature, ClassifiedCell, ForecastPoint, LineExposure, Region, RiskAggregate, RiskResult,
    RiskTier, WindAnalysisKind, WindRiskReport, WindRiskSummary,
};
use chrono::{DateTime, Utc};
use geo::{Intersects, MultiPolygon};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Wind thresholds in m/s; `moderate <= high`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindThresholds {
    pub moderate: f64,
    pub high: f64,
}

/// Risk score of one cell: distance above the moderate threshold relative to
/// the strongest risk wind, clamped to 0..=100
#[must_use]
pub fn risk_score(wind: f64, moderate: f64, max_wind: f64) -> f64 {
    let span = max_wind - moderate;
    if span <= 0.0 {
        return 0.0;
    }
    ((wind - moderate) / span * 100.0).clamp(0.0, 100.0)
}

pub(crate) struct WindInputs<'a> {
    pub region: &'a Region,
    pub points: &'a [ForecastPoint],
    pub timestamps: &'a [DateTime<Utc>],
    pub thresholds: WindThresholds,
    /// `Some` when power lines are analysed, possibly empty
    pub lines: Option<&'a [AssetFeature]>,
    pub corridor_buffer_m: f64,
    pub cell_half_size_deg: f64,
    pub estimator: Option<&'a dyn CustomerEstimator>,
}

struct TimestampRisk {
    timestamp: DateTime<Utc>,
    high_cells: usize,
    max_wind: f64,
}

pub(crate) fn evaluate(inputs: &WindInputs<'_>) -> WindRiskReport {
    let WindThresholds { moderate, high } = inputs.thresholds;
    let wanted: BTreeSet<DateTime<Utc>> = inputs.timestamps.iter().copied().collect();

    let mut by_timestamp: BTreeMap<DateTime<Utc>, Vec<&ForecastPoint>> = BTreeMap::new();
    for point in inputs.points {
        if wanted.contains(&point.timestamp) && point.geometry.intersects(&inputs.region.boundary) {
            by_timestamp.entry(point.timestamp).or_default().push(point);
        }
    }

    let mut cells: Vec<ClassifiedCell> = Vec::new();
    for (timestamp, points) in &by_timestamp {
        for point in points {
            let Some(wind) = point.wind() else {
                continue;
            };
            let tier = RiskTier::classify(wind, moderate, high);
            if tier == RiskTier::None {
                continue;
            }
            cells.push(ClassifiedCell {
                cell_id: point.cell_id(),
                timestamp: *timestamp,
                tier,
                value: wind,
                score: 0.0,
                polygon: point.cell_polygon(inputs.cell_half_size_deg),
            });
        }
    }

    let max_wind = cells.iter().map(|c| c.value).max_by(f64::total_cmp);
    if let Some(max_wind) = max_wind {
        for cell in &mut cells {
            cell.score = risk_score(cell.value, moderate, max_wind);
        }
    }

    let corridors = inputs
        .lines
        .map(|lines| CorridorIndex::new(lines, inputs.corridor_buffer_m));
    let mut peak_tiers: BTreeMap<String, RiskTier> = BTreeMap::new();
    let mut results = Vec::new();
    let mut events = Vec::new();

    for timestamp in inputs.timestamps {
        let at_timestamp: Vec<&ClassifiedCell> =
            cells.iter().filter(|c| c.timestamp == *timestamp).collect();
        if at_timestamp.is_empty() {
            continue;
        }

        // Highest tier of any risk cell touching each corridor
        let mut line_tiers: BTreeMap<&str, RiskTier> = BTreeMap::new();
        if let Some(index) = &corridors {
            for cell in &at_timestamp {
                for corridor in index.intersecting(&cell.polygon) {
                    let tier = line_tiers.entry(corridor.asset_id.as_str()).or_default();
                    *tier = (*tier).max(cell.tier);
                }
            }
        }
        for (id, tier) in &line_tiers {
            let peak = peak_tiers.entry((*id).to_string()).or_default();
            *peak = (*peak).max(*tier);
        }

        for tier in [RiskTier::High, RiskTier::Moderate] {
            let tier_cells: Vec<&&ClassifiedCell> =
                at_timestamp.iter().filter(|c| c.tier == tier).collect();
            if tier_cells.is_empty() {
                continue;
            }
            let mut result = RiskResult::new(*timestamp, tier);
            result.cell_ids = tier_cells.iter().map(|c| c.cell_id.clone()).collect();
            result.extreme_value = tier_cells.iter().map(|c| c.value).max_by(f64::total_cmp);
            result.asset_ids = line_tiers
                .iter()
                .filter(|(_, t)| **t == tier)
                .map(|(id, _)| (*id).to_string())
                .collect();
            if let Some(estimator) = inputs.estimator {
                let footprint =
                    MultiPolygon(tier_cells.iter().map(|c| c.polygon.clone()).collect());
                result.aggregate = estimator
                    .estimate(inputs.region, &footprint, &result.asset_ids)
                    .map(|customers| RiskAggregate {
                        affected_customers: Some(customers),
                        ..RiskAggregate::default()
                    });
            }
            results.push(result);
        }

        events.push(TimestampRisk {
            timestamp: *timestamp,
            high_cells: at_timestamp.iter().filter(|c| c.tier == RiskTier::High).count(),
            max_wind: at_timestamp
                .iter()
                .map(|c| c.value)
                .fold(f64::NEG_INFINITY, f64::max),
        });
    }

    let lines: Vec<LineExposure> = match (&corridors, inputs.lines) {
        (Some(index), Some(features)) => index
            .corridors()
            .iter()
            .filter_map(|corridor| {
                let feature = features.iter().find(|f| f.id == corridor.asset_id)?;
                Some(LineExposure {
                    feature: feature.clone(),
                    corridor: MultiPolygon(corridor.capsules.clone()),
                    peak_tier: peak_tiers
                        .get(&corridor.asset_id)
                        .copied()
                        .unwrap_or_default(),
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    let no_data = inputs.points.is_empty();
    let lines_at_risk = peak_tiers.len();
    let kind = if inputs.lines.is_some() && lines_at_risk > 0 {
        WindAnalysisKind::PowerLineImpact
    } else {
        WindAnalysisKind::GeneralWind
    };

    let highest = events.iter().fold(None::<&TimestampRisk>, |best, event| match best {
        Some(b) if (event.high_cells, event.max_wind) <= (b.high_cells, b.max_wind) => Some(b),
        _ => Some(event),
    });

    let summary = WindRiskSummary {
        risk_events: events.len(),
        high_risk_cells: cells.iter().filter(|c| c.tier == RiskTier::High).count(),
        moderate_risk_cells: cells.iter().filter(|c| c.tier == RiskTier::Moderate).count(),
        max_wind,
        highest_risk_timestamp: highest.map(|e| e.timestamp),
        lines_at_risk,
        message: summary_message(no_data, events.len(), inputs.lines, lines_at_risk, moderate),
    };
    debug!(
        "Wind risk over {} timestamps: {} events, {} lines at risk",
        inputs.timestamps.len(),
        summary.risk_events,
        lines_at_risk
    );

    WindRiskReport {
        kind,
        results,
        timestamps: inputs.timestamps.to_vec(),
        no_data,
        cells,
        lines,
        summary,
    }
}

fn summary_message(
    no_data: bool,
    events: usize,
    lines: Option<&[AssetFeature]>,
    lines_at_risk: usize,
    moderate: f64,
) -> String {
    if no_data {
        return "No forecast data available for the requested window.".to_string();
    }
    if events == 0 {
        return format!("No wind at or above {moderate} m/s in the forecast window.");
    }
    let description = match lines {
        None => "general wind risk areas",
        Some([]) => "general wind risk areas (no power line data in region)",
        Some(_) if lines_at_risk == 0 => "general wind risk areas (none intersected power lines)",
        Some(_) => "potential power line impacts",
    };
    format!("Found {events} timestamps with {description}.")
}
