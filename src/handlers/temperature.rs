//! `unsafe_temperature`: cells below a °F threshold and the oil wells inside them

use super::dataset::asset_feature;
use super::ramp::ColorRamp;
use super::region_layer;
use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::{
    Action, ActionType, AssetFeature, Layer, LayerFeature, LayerMetadata, LayerRole, LayerStyle,
    TemperatureRiskReport, TimeSelection,
};
use crate::risk::TemperatureRiskRequest;
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

/// Affected wells drawn at most
pub const MAX_AFFECTED_WELLS: usize = 50;
/// Normal wells drawn at most, evenly sampled
pub const MAX_NORMAL_WELLS: usize = 20;

pub struct UnsafeTemperatureHandler;

/// Every `len / limit`-th well, at most `limit` of them
fn sample_evenly(wells: &[AssetFeature], limit: usize) -> Vec<&AssetFeature> {
    let step = (wells.len() / limit.max(1)).max(1);
    wells.iter().step_by(step).take(limit).collect()
}

fn well_layer(
    label: &str,
    wells: Vec<&AssetFeature>,
    fill: &str,
    radius: f64,
    total: usize,
    context: LayerMetadata,
) -> Layer {
    let features: Vec<LayerFeature> = wells.into_iter().map(asset_feature).collect();
    let metadata = context
        .with_property("shown", json!(features.len()))
        .with_property("total", json!(total));
    Layer::new(label, LayerRole::Risk, metadata)
        .with_style(LayerStyle {
            radius: Some(radius),
            ..LayerStyle::area("black", fill, 1.0, 0.7)
        })
        .with_features(features)
}

/// Day-aggregated selections carry the forecast date next to the
/// representative timestamp
fn report_metadata(
    label: String,
    report: &TemperatureRiskReport,
    time: TimeSelection,
) -> LayerMetadata {
    let mut metadata = LayerMetadata::new("weather_forecast")
        .with_region(label)
        .with_property("min_temp_f", json!(report.min_temp_f))
        .with_property("unsafe_cells", json!(report.cells.len()));
    if let Some(result) = &report.result {
        metadata = metadata.with_timestamp(result.timestamp);
        if !time.is_single_timestamp() {
            let date = result.timestamp.date_naive();
            metadata = metadata.with_property("date", json!(date.to_string()));
        }
        if let Some(coldest) = result.extreme_value {
            metadata = metadata.with_property("coldest_f", json!(coldest));
        }
        if let Some(aggregate) = &result.aggregate {
            metadata = metadata.with_property("aggregate", json!(aggregate));
        }
    }
    metadata.no_data = report.no_data;
    metadata
}

#[async_trait]
impl ActionHandler for UnsafeTemperatureHandler {
    fn action_type(&self) -> ActionType {
        ActionType::UnsafeTemperature
    }

    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::UnsafeTemperature(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let region = ctx.resolve_region(&params.region, None).await?;
        let request = TemperatureRiskRequest {
            min_temp_f: params.min_temp_f,
            show_oil_wells: params.show_oil_wells,
            time: params.time,
        };
        let report = ctx
            .engine
            .analyze_unsafe_temperature(&*ctx.datasets, &region, &request)
            .await?;

        let mut metadata = report_metadata(region.label(), &report, params.time);
        let mut outline = region_layer(
            &region.label(),
            &region,
            "region_boundaries",
            LayerRole::Base,
            LayerStyle::area("black", "transparent", 2.0, 0.0),
        );
        outline.metadata.timestamp = metadata.timestamp;
        let mut layers = vec![outline];
        let mut well_context = LayerMetadata::new("oil_wells").with_region(region.label());
        well_context.timestamp = metadata.timestamp;
        if let Some(date) = metadata.properties.get("date") {
            well_context = well_context.with_property("date", date.clone());
        }

        if report.no_data {
            metadata.notice = Some("No forecast data available for the selected time.".to_string());
        } else if report.cells.is_empty() {
            metadata.notice = Some(format!(
                "No temperatures below {}°F in {}",
                params.min_temp_f,
                region.label()
            ));
        }
        if params.oil_wells_demoted {
            warn!("Oil well data unavailable for {}", region.label());
            let demotion = format!(
                "Oil well data is only available for {}",
                ctx.engine.config().oil_well_region
            );
            metadata.notice = Some(match metadata.notice.take() {
                Some(notice) => format!("{notice}. {demotion}"),
                None => demotion,
            });
        }

        let ramp = match report.result.as_ref().and_then(|r| r.extreme_value) {
            Some(coldest) => ColorRamp::cold(coldest, params.min_temp_f),
            None => ColorRamp::cold(params.min_temp_f, params.min_temp_f),
        };
        let features: Vec<LayerFeature> = report
            .cells
            .iter()
            .map(|cell| {
                LayerFeature::new(cell.polygon.clone())
                    .with_property("cell_id", json!(cell.cell_id))
                    .with_property("temperature_f", json!(cell.value))
                    .with_property("timestamp", json!(cell.timestamp.to_rfc3339()))
                    .with_property("cold_score", json!(cell.score))
                    .with_property("fill_color", json!(ramp.color(cell.value)))
            })
            .collect();
        info!(
            "unsafe_temperature: {} cells below {}°F in {}",
            features.len(),
            params.min_temp_f,
            region.label()
        );
        layers.push(
            Layer::new(
                format!("Temperature below {}°F", params.min_temp_f),
                LayerRole::Risk,
                metadata.with_property("ramp", json!(ramp.stops())),
            )
            .with_style(LayerStyle::area("black", "#2171b5", 0.5, 0.7))
            .with_features(features),
        );

        if !report.affected_wells.is_empty() {
            let shown = report.affected_wells.iter().take(MAX_AFFECTED_WELLS).collect();
            layers.push(well_layer(
                "Oil Wells at Risk",
                shown,
                "red",
                5.0,
                report.affected_wells.len(),
                well_context.clone(),
            ));
        }
        if !report.normal_wells.is_empty() {
            layers.push(well_layer(
                "Oil Wells",
                sample_evenly(&report.normal_wells, MAX_NORMAL_WELLS),
                "green",
                3.0,
                report.normal_wells.len(),
                well_context,
            ));
        }
        Ok(layers)
    }
}
