//! Unsafe cold temperature analysis and the oil well join

use crate::models::forecast::kelvin_to_fahrenheit;
use crate::models::{
    AssetFeature, ClassifiedCell, ForecastPoint, Region, RiskAggregate, RiskResult, RiskTier,
    TemperatureRiskReport, WeatherVariable,
};
use chrono::{DateTime, Utc};
use geo::{Intersects, Polygon};
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) struct TemperatureInputs<'a> {
    pub region: &'a Region,
    /// Points of the selected timestamp, or of every canonical hour of the selected day
    pub points: &'a [ForecastPoint],
    /// Timestamp stamped on the result
    pub stamp: DateTime<Utc>,
    pub min_temp_f: f64,
    /// `Some` when wells are analysed
    pub wells: Option<&'a [AssetFeature]>,
    pub cell_half_size_deg: f64,
}

struct ColdestReading {
    temp_f: f64,
    timestamp: DateTime<Utc>,
    polygon: Polygon<f64>,
}

pub(crate) fn evaluate(inputs: &TemperatureInputs<'_>) -> TemperatureRiskReport {
    if inputs.points.is_empty() {
        return TemperatureRiskReport {
            result: None,
            no_data: true,
            cells: Vec::new(),
            min_temp_f: inputs.min_temp_f,
            affected_wells: Vec::new(),
            normal_wells: Vec::new(),
        };
    }

    // Minimum per cell across the selected hours
    let mut coldest: BTreeMap<String, ColdestReading> = BTreeMap::new();
    for point in inputs.points {
        if !point.geometry.intersects(&inputs.region.boundary) {
            continue;
        }
        let Some(kelvin) = point.value(WeatherVariable::Temperature) else {
            continue;
        };
        let temp_f = kelvin_to_fahrenheit(kelvin);
        let reading = coldest
            .entry(point.cell_id())
            .or_insert_with(|| ColdestReading {
                temp_f,
                timestamp: point.timestamp,
                polygon: point.cell_polygon(inputs.cell_half_size_deg),
            });
        if temp_f < reading.temp_f {
            reading.temp_f = temp_f;
            reading.timestamp = point.timestamp;
        }
    }

    let unsafe_cells: Vec<(String, ColdestReading)> = coldest
        .into_iter()
        .filter(|(_, reading)| reading.temp_f < inputs.min_temp_f)
        .collect();
    let coldest_f = unsafe_cells
        .iter()
        .map(|(_, r)| r.temp_f)
        .min_by(f64::total_cmp);

    let cells: Vec<ClassifiedCell> = unsafe_cells
        .into_iter()
        .map(|(cell_id, reading)| ClassifiedCell {
            cell_id,
            timestamp: reading.timestamp,
            tier: RiskTier::High,
            score: cold_score(reading.temp_f, inputs.min_temp_f, coldest_f),
            value: reading.temp_f,
            polygon: reading.polygon,
        })
        .collect();

    let (affected_wells, normal_wells): (Vec<AssetFeature>, Vec<AssetFeature>) = inputs
        .wells
        .unwrap_or_default()
        .iter()
        .cloned()
        .partition(|well| cells.iter().any(|c| well.geometry.intersects(&c.polygon)));

    let tier = if cells.is_empty() {
        RiskTier::None
    } else {
        RiskTier::High
    };
    let mut result = RiskResult::new(inputs.stamp, tier);
    result.cell_ids = cells.iter().map(|c| c.cell_id.clone()).collect();
    result.asset_ids = affected_wells.iter().map(|w| w.id.clone()).collect();
    result.extreme_value = coldest_f;
    if inputs.wells.is_some() {
        result.aggregate = Some(RiskAggregate {
            affected_wells: Some(affected_wells.len()),
            total_wells: Some(affected_wells.len() + normal_wells.len()),
            ..RiskAggregate::default()
        });
    }
    debug!(
        "{} cells below {}°F, {} wells affected",
        cells.len(),
        inputs.min_temp_f,
        affected_wells.len()
    );

    TemperatureRiskReport {
        result: Some(result),
        no_data: false,
        cells,
        min_temp_f: inputs.min_temp_f,
        affected_wells,
        normal_wells,
    }
}

/// 0 at the threshold, 100 at the coldest unsafe cell
fn cold_score(temp_f: f64, threshold: f64, coldest: Option<f64>) -> f64 {
    match coldest {
        Some(coldest) if threshold > coldest => {
            ((threshold - temp_f) / (threshold - coldest) * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}
