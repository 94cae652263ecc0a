//! `show_weather`: one forecast variable as coloured cells

use super::ramp::ColorRamp;
use super::region_layer;
use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::action::ShowWeather;
use crate::models::forecast::is_canonical;
use crate::models::{
    Action, ActionType, ForecastPoint, Layer, LayerFeature, LayerMetadata, LayerRole, LayerStyle,
    Region, TimeSelection, TimeWindow, WeatherVariable,
};
use async_trait::async_trait;
use geo::Polygon;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct ShowWeatherHandler;

fn title(variable: WeatherVariable) -> &'static str {
    match variable {
        WeatherVariable::WindSpeed => "Wind Speed",
        WeatherVariable::WindGust => "Wind Gust",
        WeatherVariable::Temperature => "Temperature",
        WeatherVariable::Precipitation => "Precipitation",
    }
}

/// Strongest display value per cell
fn max_per_cell(
    points: &[ForecastPoint],
    variable: WeatherVariable,
    half_size_deg: f64,
) -> BTreeMap<String, (f64, Polygon<f64>)> {
    let mut cells: BTreeMap<String, (f64, Polygon<f64>)> = BTreeMap::new();
    for point in points {
        let Some(raw) = point.value(variable) else {
            continue;
        };
        let value = variable.to_display(raw);
        let cell = cells
            .entry(point.cell_id())
            .or_insert_with(|| (value, point.cell_polygon(half_size_deg)));
        if value > cell.0 {
            cell.0 = value;
        }
    }
    cells
}

impl ShowWeatherHandler {
    /// Clamp past dates to the session's first forecast day
    fn effective_time(params: &ShowWeather, ctx: &HandlerContext) -> TimeSelection {
        match params.time {
            TimeSelection::Date(date) if date < ctx.reference_date => {
                debug!(
                    "Forecast date {} precedes {}; using the latter",
                    date, ctx.reference_date
                );
                TimeSelection::Date(ctx.reference_date)
            }
            other => other,
        }
    }
}

#[async_trait]
impl ActionHandler for ShowWeatherHandler {
    fn action_type(&self) -> ActionType {
        ActionType::ShowWeather
    }

    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::ShowWeather(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let region = match &params.region {
            Some(text) => Some(ctx.resolve_region(text, None).await?),
            None => None,
        };
        let region_ref = region.as_deref();
        let time = Self::effective_time(params, ctx);

        let window = match time {
            TimeSelection::Timestamp(ts) => TimeWindow::instant(ts),
            TimeSelection::Date(date) => TimeWindow::days(date, 1),
            TimeSelection::Latest => TimeWindow::unbounded(),
        };
        let scope = region_ref.map_or_else(|| "all regions".to_string(), Region::label);
        let mut points = ctx
            .datasets
            .fetch_forecast(region_ref, window)
            .await
            .map_err(|e| e.with_fetch_context("fetch_forecast", &scope, Some(&window)))?;
        if !time.is_single_timestamp() {
            points.retain(|p| is_canonical(&p.timestamp));
            let latest = points.iter().map(|p| p.timestamp.date_naive()).max();
            points.retain(|p| Some(p.timestamp.date_naive()) == latest);
        }

        let variable = params.parameter;
        let unit = variable.display_unit();
        let cells = max_per_cell(&points, variable, ctx.engine.config().cell_half_size_deg);

        let mut metadata = LayerMetadata::new("weather_forecast")
            .with_property("parameter", json!(variable.as_str()))
            .with_property("unit", json!(unit));
        if let Some(region) = region_ref {
            metadata = metadata.with_region(region.label());
        }
        match time {
            TimeSelection::Timestamp(ts) => metadata = metadata.with_timestamp(ts),
            _ => {
                if let Some(date) = points.first().map(|p| p.timestamp.date_naive()) {
                    metadata = metadata.with_property("date", json!(date.to_string()));
                }
            }
        }

        let mut layers = Vec::new();
        if let Some(region) = region_ref {
            layers.push(region_layer(
                &region.label(),
                region,
                "region_boundaries",
                LayerRole::Base,
                LayerStyle::area("black", "transparent", 2.0, 0.0),
            ));
        }

        let label = format!("{} ({unit})", title(variable));
        if cells.is_empty() {
            metadata.no_data = true;
            metadata.notice = Some(format!("No {} forecast data for the selected time", variable));
            info!("show_weather: no {} data", variable);
            layers.push(Layer::new(label, LayerRole::Overlay, metadata));
            return Ok(layers);
        }

        let min = cells.values().map(|(v, _)| *v).fold(f64::INFINITY, f64::min);
        let max = cells.values().map(|(v, _)| *v).fold(f64::NEG_INFINITY, f64::max);
        let ramp = ColorRamp::for_variable(variable, min, max);
        let features: Vec<LayerFeature> = cells
            .into_iter()
            .map(|(cell_id, (value, polygon))| {
                LayerFeature::new(polygon)
                    .with_property("cell_id", json!(cell_id))
                    .with_property("value", json!(value))
                    .with_property("fill_color", json!(ramp.color(value)))
            })
            .collect();
        info!("show_weather: {} cells of {}", features.len(), variable);

        metadata = metadata
            .with_property("min", json!(min))
            .with_property("max", json!(max))
            .with_property("ramp", json!(ramp.stops()));
        layers.push(
            Layer::new(label, LayerRole::Overlay, metadata)
                .with_style(LayerStyle {
                    weight: Some(0.0),
                    fill_opacity: Some(0.7),
                    ..LayerStyle::default()
                })
                .with_features(features),
        );
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StaticDatasets;
    use crate::handlers::testing;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use geo::Point;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
    }

    fn context(points: Vec<ForecastPoint>) -> HandlerContext {
        testing::context(StaticDatasets::new().with_forecast(points))
    }

    fn temp(ts: DateTime<Utc>, kelvin: f64) -> ForecastPoint {
        ForecastPoint::new(Point::new(-89.0, 40.0), ts, ts.date_naive())
            .with_value(WeatherVariable::Temperature, kelvin)
    }

    fn action(time: TimeSelection) -> Action {
        Action::ShowWeather(ShowWeather {
            parameter: WeatherVariable::Temperature,
            time,
            region: None,
        })
    }

    #[tokio::test]
    async fn test_date_keeps_daily_maximum_in_celsius() {
        let ctx = context(vec![
            temp(at(10, 6), 273.15),
            temp(at(10, 12), 283.15),
            temp(at(10, 18), 278.15),
        ]);
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let layers = ShowWeatherHandler
            .handle(&action(TimeSelection::Date(date)), &ctx)
            .await
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].label, "Temperature (°C)");
        let value = layers[0].features[0].properties["value"].as_f64().unwrap();
        assert!((value - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_past_date_is_clamped_to_reference() {
        let ctx = context(vec![temp(at(10, 12), 280.0)]);
        let past = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let layers = ShowWeatherHandler
            .handle(&action(TimeSelection::Date(past)), &ctx)
            .await
            .unwrap();
        assert_eq!(layers[0].features.len(), 1);
        assert_eq!(layers[0].metadata.properties["date"], json!("2025-01-10"));
    }

    #[tokio::test]
    async fn test_latest_uses_last_day() {
        let ctx = context(vec![temp(at(10, 12), 280.0), temp(at(12, 6), 290.0)]);
        let layers = ShowWeatherHandler
            .handle(&action(TimeSelection::Latest), &ctx)
            .await
            .unwrap();
        assert_eq!(layers[0].metadata.properties["date"], json!("2025-01-12"));
    }

    #[tokio::test]
    async fn test_missing_timestamp_is_no_data_layer() {
        let ctx = context(vec![temp(at(10, 12), 280.0)]);
        let layers = ShowWeatherHandler
            .handle(&action(TimeSelection::Timestamp(at(10, 18))), &ctx)
            .await
            .unwrap();
        assert!(layers[0].metadata.no_data);
        assert!(layers[0].is_empty());
        assert_eq!(layers[0].metadata.timestamp, Some(at(10, 18)));
    }
}
