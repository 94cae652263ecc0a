//! Geometric risk engine
//!
//! Fetches forecast and asset data through the dataset facade and runs the
//! wind-vs-power-line and unsafe-temperature analyses over it. The analyses
//! themselves are pure functions in [`wind`] and [`temperature`].

pub mod corridor;
pub mod customers;
pub mod temperature;
pub mod wind;

pub use customers::{CustomerEstimator, PerLineEstimator};
pub use wind::{WindThresholds, risk_score};

use crate::Result;
use crate::config::RiskConfig;
use crate::dataset::DatasetAccess;
use crate::models::forecast::{canonical_timestamps, is_canonical};
use crate::models::region::lookup_state;
use crate::models::{
    AssetDataset, AssetFeature, ForecastPoint, Region, TemperatureRiskReport, TimeSelection,
    TimeWindow, WindRiskReport,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters of one wind risk run
#[derive(Debug, Clone, PartialEq)]
pub struct WindRiskRequest {
    /// `None` uses the configured default horizon
    pub forecast_days: Option<u32>,
    pub thresholds: WindThresholds,
    pub analyze_power_lines: bool,
}

/// Parameters of one unsafe temperature run
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRiskRequest {
    pub min_temp_f: f64,
    pub show_oil_wells: bool,
    pub time: TimeSelection,
}

#[derive(Clone)]
pub struct RiskEngine {
    config: RiskConfig,
    estimator: Option<Arc<dyn CustomerEstimator>>,
}

impl RiskEngine {
    #[must_use]
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            estimator: None,
        }
    }

    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn CustomerEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// True when oil well data covers `region`
    #[must_use]
    pub fn has_oil_well_coverage(&self, region: &Region) -> bool {
        lookup_state(&self.config.oil_well_region)
            .is_some_and(|state| state.code.eq_ignore_ascii_case(&region.state_code))
    }

    /// Wind risk at every canonical hour of `forecast_days` days from `reference_date`
    #[tracing::instrument(level = "debug", skip(self, datasets, region), fields(region = %region.label()))]
    pub async fn analyze_wind_risk(
        &self,
        datasets: &dyn DatasetAccess,
        region: &Region,
        reference_date: NaiveDate,
        request: &WindRiskRequest,
    ) -> Result<WindRiskReport> {
        let days = self.config.forecast_days(request.forecast_days);
        let timestamps = canonical_timestamps(reference_date, days);
        let window = TimeWindow::days(reference_date, days);
        let points = fetch_forecast(datasets, region, window).await?;
        let lines = if request.analyze_power_lines {
            Some(fetch_assets(datasets, AssetDataset::PowerLines, region).await?)
        } else {
            None
        };

        let report = wind::evaluate(&wind::WindInputs {
            region,
            points: &points,
            timestamps: &timestamps,
            thresholds: request.thresholds,
            lines: lines.as_deref(),
            corridor_buffer_m: self.config.corridor_buffer_m,
            cell_half_size_deg: self.config.cell_half_size_deg,
            estimator: self.estimator.as_deref(),
        });
        info!("{}: {}", region.label(), report.summary.message);
        Ok(report)
    }

    /// Cells below `min_temp_f` for the selected time, and the wells inside them
    #[tracing::instrument(level = "debug", skip(self, datasets, region), fields(region = %region.label()))]
    pub async fn analyze_unsafe_temperature(
        &self,
        datasets: &dyn DatasetAccess,
        region: &Region,
        request: &TemperatureRiskRequest,
    ) -> Result<TemperatureRiskReport> {
        let (points, stamp) = match request.time {
            TimeSelection::Timestamp(timestamp) => {
                let points =
                    fetch_forecast(datasets, region, TimeWindow::instant(timestamp)).await?;
                (points, Some(timestamp))
            }
            TimeSelection::Date(date) => {
                let mut points = fetch_forecast(datasets, region, TimeWindow::days(date, 1)).await?;
                points.retain(|p| is_canonical(&p.timestamp));
                (points, first_canonical(date))
            }
            TimeSelection::Latest => {
                let mut points = fetch_forecast(datasets, region, TimeWindow::unbounded()).await?;
                points.retain(|p| is_canonical(&p.timestamp));
                let latest = points.iter().map(|p| p.timestamp.date_naive()).max();
                debug!("Latest forecast date: {:?}", latest);
                points.retain(|p| Some(p.timestamp.date_naive()) == latest);
                (points, latest.and_then(first_canonical))
            }
        };

        let wells = if request.show_oil_wells && self.has_oil_well_coverage(region) {
            Some(fetch_assets(datasets, AssetDataset::OilWells, region).await?)
        } else {
            None
        };

        let Some(stamp) = stamp.filter(|_| !points.is_empty()) else {
            info!("{}: no forecast data for {:?}", region.label(), request.time);
            return Ok(temperature::evaluate(&temperature::TemperatureInputs {
                region,
                points: &[],
                stamp: DateTime::<Utc>::MIN_UTC,
                min_temp_f: request.min_temp_f,
                wells: None,
                cell_half_size_deg: self.config.cell_half_size_deg,
            }));
        };

        let report = temperature::evaluate(&temperature::TemperatureInputs {
            region,
            points: &points,
            stamp,
            min_temp_f: request.min_temp_f,
            wells: wells.as_deref(),
            cell_half_size_deg: self.config.cell_half_size_deg,
        });
        info!(
            "{}: {} cells below {}°F",
            region.label(),
            report.cells.len(),
            request.min_temp_f
        );
        Ok(report)
    }
}

async fn fetch_forecast(
    datasets: &dyn DatasetAccess,
    region: &Region,
    window: TimeWindow,
) -> Result<Vec<ForecastPoint>> {
    datasets
        .fetch_forecast(Some(region), window)
        .await
        .map_err(|e| e.with_fetch_context("fetch_forecast", &region.label(), Some(&window)))
}

async fn fetch_assets(
    datasets: &dyn DatasetAccess,
    dataset: AssetDataset,
    region: &Region,
) -> Result<Vec<AssetFeature>> {
    datasets
        .fetch_asset_features(dataset, Some(region))
        .await
        .map_err(|e| {
            e.with_fetch_context(
                "fetch_asset_features",
                &format!("{dataset} in {}", region.label()),
                None,
            )
        })
}

fn first_canonical(date: NaiveDate) -> Option<DateTime<Utc>> {
    canonical_timestamps(date, 1).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StaticDatasets;
    use crate::models::{
        AssetFeature, ForecastPoint, RegionKind, RiskTier, WeatherVariable, WindAnalysisKind,
    };
    use chrono::TimeZone;
    use geo::{LineString, MultiPolygon, Point, Rect};

    fn state(name: &str, code: &str, fips: &str, rect: Rect<f64>) -> Region {
        Region {
            kind: RegionKind::State,
            name: name.to_string(),
            state_code: code.to_string(),
            fips: fips.to_string(),
            boundary: MultiPolygon(vec![rect.to_polygon()]),
        }
    }

    fn illinois() -> Region {
        state("Illinois", "IL", "17", Rect::new((-91.0, 37.0), (-87.5, 42.5)))
    }

    fn north_dakota() -> Region {
        state("North Dakota", "ND", "38", Rect::new((-104.05, 45.93), (-96.55, 49.0)))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, hour, 0, 0).unwrap()
    }

    fn wind(lon: f64, lat: f64, ts: DateTime<Utc>, speed: f64) -> ForecastPoint {
        ForecastPoint::new(Point::new(lon, lat), ts, day(10))
            .with_value(WeatherVariable::WindSpeed, speed)
    }

    fn temp(lon: f64, lat: f64, ts: DateTime<Utc>, kelvin: f64) -> ForecastPoint {
        ForecastPoint::new(Point::new(lon, lat), ts, day(10))
            .with_value(WeatherVariable::Temperature, kelvin)
    }

    fn wind_request(days: Option<u32>, lines: bool) -> WindRiskRequest {
        WindRiskRequest {
            forecast_days: days,
            thresholds: WindThresholds {
                moderate: 9.0,
                high: 15.0,
            },
            analyze_power_lines: lines,
        }
    }

    #[tokio::test]
    async fn test_wind_uses_default_horizon() {
        let datasets = StaticDatasets::new().with_forecast(vec![
            wind(-89.0, 40.0, at(10, 6), 16.0),
            wind(-89.0, 40.0, at(12, 18), 16.0),
            // Day four is outside the default three-day horizon
            wind(-89.0, 40.0, at(13, 6), 16.0),
        ]);
        let engine = RiskEngine::new(RiskConfig::default());
        let report = engine
            .analyze_wind_risk(&datasets, &illinois(), day(10), &wind_request(None, false))
            .await
            .unwrap();
        assert_eq!(report.timestamps.len(), 9);
        let stamps: Vec<_> = report.results.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![at(10, 6), at(12, 18)]);
        assert_eq!(report.kind, WindAnalysisKind::GeneralWind);
    }

    #[tokio::test]
    async fn test_wind_joins_power_lines_and_estimates_customers() {
        let datasets = StaticDatasets::new()
            .with_forecast(vec![wind(-89.0, 40.0, at(10, 12), 20.0)])
            .with_assets(
                AssetDataset::PowerLines,
                vec![AssetFeature::new(
                    "line-7",
                    LineString::from(vec![(-89.1, 40.0), (-88.9, 40.0)]),
                )],
            );
        let engine = RiskEngine::new(RiskConfig::default()).with_estimator(Arc::new(
            PerLineEstimator {
                customers_per_line: 1200,
            },
        ));
        let report = engine
            .analyze_wind_risk(&datasets, &illinois(), day(10), &wind_request(Some(1), true))
            .await
            .unwrap();
        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.tier, RiskTier::High);
        assert!(result.asset_ids.contains("line-7"));
        assert_eq!(
            result.aggregate.as_ref().and_then(|a| a.affected_customers),
            Some(1200)
        );
    }

    #[tokio::test]
    async fn test_wind_without_data_flags_no_data() {
        let engine = RiskEngine::new(RiskConfig::default());
        let report = engine
            .analyze_wind_risk(
                &StaticDatasets::new(),
                &illinois(),
                day(10),
                &wind_request(Some(2), true),
            )
            .await
            .unwrap();
        assert!(report.no_data);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn test_temperature_latest_date_is_used() {
        let datasets = StaticDatasets::new()
            .with_forecast(vec![
                temp(-100.0, 47.0, at(10, 6), 250.0),
                temp(-100.0, 47.0, at(11, 12), 290.0),
                temp(-100.0, 47.0, at(11, 18), 289.0),
            ])
            .with_assets(
                AssetDataset::OilWells,
                vec![AssetFeature::new("w1", Point::new(-100.0, 47.0))],
            );
        let engine = RiskEngine::new(RiskConfig::default());
        let request = TemperatureRiskRequest {
            min_temp_f: 20.0,
            show_oil_wells: true,
            time: TimeSelection::Latest,
        };
        let report = engine
            .analyze_unsafe_temperature(&datasets, &north_dakota(), &request)
            .await
            .unwrap();
        // Only the 11th is considered, and it is warm
        let result = report.result.unwrap();
        assert_eq!(result.timestamp, at(11, 6));
        assert_eq!(result.tier, RiskTier::None);
        assert_eq!(result.aggregate.unwrap().total_wells, Some(1));
    }

    #[tokio::test]
    async fn test_temperature_wells_skipped_outside_coverage() {
        let texas = state("Texas", "TX", "48", Rect::new((-106.6, 25.8), (-93.5, 36.5)));
        let datasets = StaticDatasets::new()
            .with_forecast(vec![temp(-100.0, 32.0, at(10, 12), 250.0)])
            .with_assets(
                AssetDataset::OilWells,
                vec![AssetFeature::new("w1", Point::new(-100.0, 32.0))],
            );
        let engine = RiskEngine::new(RiskConfig::default());
        let request = TemperatureRiskRequest {
            min_temp_f: 20.0,
            show_oil_wells: true,
            time: TimeSelection::Date(day(10)),
        };
        let report = engine
            .analyze_unsafe_temperature(&datasets, &texas, &request)
            .await
            .unwrap();
        let result = report.result.unwrap();
        assert_eq!(result.tier, RiskTier::High);
        assert!(result.aggregate.is_none());
        assert!(report.affected_wells.is_empty());
    }

    #[tokio::test]
    async fn test_temperature_missing_timestamp_is_no_data() {
        let datasets =
            StaticDatasets::new().with_forecast(vec![temp(-100.0, 47.0, at(10, 6), 250.0)]);
        let engine = RiskEngine::new(RiskConfig::default());
        let request = TemperatureRiskRequest {
            min_temp_f: 20.0,
            show_oil_wells: false,
            time: TimeSelection::Timestamp(at(10, 18)),
        };
        let report = engine
            .analyze_unsafe_temperature(&datasets, &north_dakota(), &request)
            .await
            .unwrap();
        assert!(report.no_data);
        assert!(report.result.is_none());
    }
}
