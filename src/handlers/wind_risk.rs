//! `analyze_wind_risk`: wind risk cells, power line corridors and a summary

use super::dataset::asset_feature;
use super::ramp::ColorRamp;
use super::region_layer;
use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::{
    Action, ActionType, ClassifiedCell, Layer, LayerFeature, LayerMetadata, LayerRole, LayerStyle,
    Region, RiskTier, WindRiskReport,
};
use crate::risk::{WindRiskRequest, WindThresholds};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

pub struct WindRiskHandler;

/// Stable id for the risk event at `timestamp`
#[must_use]
pub fn event_id(timestamp: &DateTime<Utc>) -> String {
    format!("wind_event_{}", timestamp.format("%Y%m%d_%H%M"))
}

fn tier_style(tier: RiskTier) -> LayerStyle {
    match tier {
        RiskTier::High => LayerStyle::area("#800000", "#ff0000", 1.0, 0.6),
        _ => LayerStyle::area("#996600", "#ffaa00", 1.0, 0.5),
    }
}

fn cell_feature(cell: &ClassifiedCell, ramp: &ColorRamp) -> LayerFeature {
    LayerFeature::new(cell.polygon.clone())
        .with_property("cell_id", json!(cell.cell_id))
        .with_property("event_id", json!(event_id(&cell.timestamp)))
        .with_property("timestamp", json!(cell.timestamp.to_rfc3339()))
        .with_property("tier", json!(cell.tier.as_str()))
        .with_property("wind_speed", json!(cell.value))
        .with_property("risk_score", json!(cell.score))
        .with_property("score_color", json!(ramp.color(cell.score)))
}

/// Region and forecast window shared by every layer of one run
///
/// The timestamp is the highest-risk hour, or the window start when nothing
/// reached a tier.
fn run_metadata(source: &str, region: &Region, report: &WindRiskReport) -> LayerMetadata {
    let mut metadata = LayerMetadata::new(source).with_region(region.label());
    if let Some(ts) = report
        .summary
        .highest_risk_timestamp
        .or_else(|| report.timestamps.first().copied())
    {
        metadata = metadata.with_timestamp(ts);
    }
    if let (Some(first), Some(last)) = (report.timestamps.first(), report.timestamps.last()) {
        metadata = metadata
            .with_property("window_start", json!(first.to_rfc3339()))
            .with_property("window_end", json!(last.to_rfc3339()));
    }
    metadata
}

fn summary_metadata(region: &Region, report: &WindRiskReport) -> LayerMetadata {
    let summary = &report.summary;
    let mut metadata = run_metadata("wind_risk_analysis", region, report)
        .with_property("analysis_type", json!(report.kind.as_str()))
        .with_property("message", json!(summary.message))
        .with_property("risk_events", json!(summary.risk_events))
        .with_property("high_risk_cells", json!(summary.high_risk_cells))
        .with_property("moderate_risk_cells", json!(summary.moderate_risk_cells))
        .with_property("lines_at_risk", json!(summary.lines_at_risk))
        .with_property("results", json!(report.results));
    if let Some(max_wind) = summary.max_wind {
        metadata = metadata.with_property("max_wind", json!(max_wind));
    }
    if let Some(ts) = summary.highest_risk_timestamp {
        metadata = metadata.with_property("highest_risk_event", json!(event_id(&ts)));
    }
    if report.no_data {
        metadata.no_data = true;
        metadata.notice = Some(summary.message.clone());
    }
    metadata
}

#[async_trait]
impl ActionHandler for WindRiskHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AnalyzeWindRisk
    }

    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::AnalyzeWindRisk(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let region = ctx.resolve_region(&params.region, None).await?;
        let request = WindRiskRequest {
            forecast_days: params.forecast_days,
            thresholds: WindThresholds {
                moderate: params.moderate_threshold,
                high: params.high_threshold,
            },
            analyze_power_lines: params.analyze_power_lines,
        };
        let report = ctx
            .engine
            .analyze_wind_risk(&*ctx.datasets, &region, ctx.reference_date, &request)
            .await?;

        let mut outline = region_layer(
            &format!("{} (analysis area)", region.label()),
            &region,
            "region_boundaries",
            LayerRole::Base,
            LayerStyle::area("blue", "#8080FF", 2.0, 0.1),
        );
        outline.metadata.timestamp = run_metadata("region_boundaries", &region, &report).timestamp;
        let mut layers = vec![outline];

        if !report.lines.is_empty() {
            let corridors = report
                .lines
                .iter()
                .map(|line| {
                    LayerFeature::new(line.corridor.clone())
                        .with_property("id", json!(line.feature.id))
                        .with_property("peak_tier", json!(line.peak_tier.as_str()))
                })
                .collect();
            layers.push(
                Layer::new(
                    "Power Line Corridors",
                    LayerRole::Overlay,
                    run_metadata("power_lines", &region, &report)
                        .with_property("buffer_m", json!(ctx.engine.config().corridor_buffer_m)),
                )
                .with_style(LayerStyle::area("#666666", "#cccccc", 1.0, 0.2))
                .with_features(corridors),
            );
        }

        let ramp = ColorRamp::wind_risk();
        for (tier, label) in [
            (RiskTier::High, "High Wind Risk"),
            (RiskTier::Moderate, "Moderate Wind Risk"),
        ] {
            let features: Vec<LayerFeature> = report
                .cells
                .iter()
                .filter(|cell| cell.tier == tier)
                .map(|cell| cell_feature(cell, &ramp))
                .collect();
            if features.is_empty() {
                continue;
            }
            layers.push(
                Layer::new(
                    label,
                    LayerRole::Risk,
                    run_metadata("wind_risk_analysis", &region, &report)
                        .with_property("tier", json!(tier.as_str()))
                        .with_property("ramp", json!(ramp.stops())),
                )
                .with_style(tier_style(tier))
                .with_features(features),
            );
        }

        let at_risk: Vec<LayerFeature> = report
            .lines
            .iter()
            .filter(|line| line.peak_tier > RiskTier::None)
            .map(|line| {
                asset_feature(&line.feature).with_property("peak_tier", json!(line.peak_tier.as_str()))
            })
            .collect();
        if !at_risk.is_empty() {
            layers.push(
                Layer::new(
                    "Power Lines at Risk",
                    LayerRole::Risk,
                    run_metadata("power_lines", &region, &report)
                        .with_property("feature_count", json!(at_risk.len())),
                )
                .with_style(LayerStyle::stroke("#ff0000", 4.0).with_opacity(0.9))
                .with_features(at_risk),
            );
        }

        info!(
            "analyze_wind_risk: {} results for {}",
            report.results.len(),
            region.label()
        );
        layers.push(Layer::new(
            "Wind Risk Summary",
            LayerRole::Overlay,
            summary_metadata(&region, &report),
        ));
        Ok(layers)
    }
}
