//! Dataset access facade
//!
//! The core only talks to weather and infrastructure data through
//! [`DatasetAccess`]. [`StaticDatasets`] is an in-memory implementation that
//! can be built directly (tests, embedding) or loaded from GeoJSON files.

use crate::Result;
use crate::config::DatasetConfig;
use crate::error::GeoAssistError;
use crate::geojson::{GeoJsonFeature, parse_feature_collection};
use crate::models::region::{lookup_state, normalize_name, state_by_code, state_by_fips};
use crate::models::{
    AssetDataset, AssetFeature, ForecastPoint, Region, RegionKind, TimeWindow, WeatherVariable,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use geo::{BoundingRect, Centroid, Geometry, Intersects, MultiPolygon, Rect};
use rstar::{AABB, RTree, RTreeObject};
use std::path::Path;
use tracing::{debug, info};

/// Collaborator contract for weather and asset data
#[async_trait]
pub trait DatasetAccess: Send + Sync {
    /// Forecast points inside `region` (all points when `None`) within `window`
    async fn fetch_forecast(
        &self,
        region: Option<&Region>,
        window: TimeWindow,
    ) -> Result<Vec<ForecastPoint>>;

    /// Asset features intersecting `region` (all features when `None`)
    async fn fetch_asset_features(
        &self,
        dataset: AssetDataset,
        region: Option<&Region>,
    ) -> Result<Vec<AssetFeature>>;

    /// Boundary records matching a name; an empty result means not found
    async fn lookup_region_boundary(
        &self,
        kind: RegionKind,
        name: &str,
        state: Option<&str>,
    ) -> Result<Vec<Region>>;
}

/// Envelope of an asset inside the spatial index
#[derive(Debug, Clone)]
struct AssetBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for AssetBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Asset features with a bounding-box index
#[derive(Debug, Default)]
struct IndexedAssets {
    features: Vec<AssetFeature>,
    rtree: RTree<AssetBox>,
}

impl IndexedAssets {
    fn new(features: Vec<AssetFeature>) -> Self {
        let boxes = features
            .iter()
            .enumerate()
            .filter_map(|(idx, f)| f.geometry.bounding_rect().map(|bbox| AssetBox { idx, bbox }))
            .collect();
        Self {
            rtree: RTree::bulk_load(boxes),
            features,
        }
    }

    fn within(&self, boundary: &MultiPolygon<f64>) -> Vec<AssetFeature> {
        let Some(bbox) = boundary.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());
        let mut hits: Vec<usize> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|b| b.idx)
            .filter(|&idx| self.features[idx].geometry.intersects(boundary))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|idx| self.features[idx].clone()).collect()
    }
}

/// In-memory datasets, read-only once built
#[derive(Debug, Default)]
pub struct StaticDatasets {
    states: Vec<Region>,
    counties: Vec<Region>,
    forecast: Vec<ForecastPoint>,
    power_lines: IndexedAssets,
    oil_wells: IndexedAssets,
}

impl StaticDatasets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        for region in regions {
            match region.kind {
                RegionKind::State => self.states.push(region),
                RegionKind::County => self.counties.push(region),
            }
        }
        self
    }

    #[must_use]
    pub fn with_forecast(mut self, mut points: Vec<ForecastPoint>) -> Self {
        self.forecast.append(&mut points);
        self.forecast.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        self
    }

    #[must_use]
    pub fn with_assets(mut self, dataset: AssetDataset, features: Vec<AssetFeature>) -> Self {
        match dataset {
            AssetDataset::PowerLines => self.power_lines = IndexedAssets::new(features),
            AssetDataset::OilWells => self.oil_wells = IndexedAssets::new(features),
        }
        self
    }

    /// Load every configured GeoJSON file; unset paths leave that dataset empty
    #[tracing::instrument(name = "load_datasets", level = "debug", skip(config))]
    pub async fn load(config: &DatasetConfig) -> Result<Self> {
        let mut datasets = Self::new();

        if let Some(path) = &config.states_path {
            let features = read_features(path).await?;
            let states = features
                .iter()
                .filter_map(state_from_feature)
                .collect::<Vec<_>>();
            info!("Loaded {} state boundaries", states.len());
            datasets = datasets.with_regions(states);
        }
        if let Some(path) = &config.counties_path {
            let features = read_features(path).await?;
            let counties = features
                .iter()
                .filter_map(county_from_feature)
                .collect::<Vec<_>>();
            info!("Loaded {} county boundaries", counties.len());
            datasets = datasets.with_regions(counties);
        }
        if let Some(path) = &config.forecast_path {
            let features = read_features(path).await?;
            let context = path.display().to_string();
            let points = features
                .iter()
                .map(|f| forecast_from_feature(f, &context))
                .collect::<Result<Vec<_>>>()?;
            info!("Loaded {} forecast points", points.len());
            datasets = datasets.with_forecast(points);
        }
        if let Some(path) = &config.power_lines_path {
            let features = read_features(path).await?;
            let lines = assets_from_features(features, "line");
            info!("Loaded {} power line segments", lines.len());
            datasets = datasets.with_assets(AssetDataset::PowerLines, lines);
        }
        if let Some(path) = &config.oil_wells_path {
            let features = read_features(path).await?;
            let wells = assets_from_features(features, "well");
            info!("Loaded {} oil wells", wells.len());
            datasets = datasets.with_assets(AssetDataset::OilWells, wells);
        }

        Ok(datasets)
    }

    fn assets(&self, dataset: AssetDataset) -> &IndexedAssets {
        match dataset {
            AssetDataset::PowerLines => &self.power_lines,
            AssetDataset::OilWells => &self.oil_wells,
        }
    }
}

#[async_trait]
impl DatasetAccess for StaticDatasets {
    #[tracing::instrument(name = "fetch_forecast", level = "debug", skip(self, region), fields(region = ?region.map(Region::label)))]
    async fn fetch_forecast(
        &self,
        region: Option<&Region>,
        window: TimeWindow,
    ) -> Result<Vec<ForecastPoint>> {
        let points: Vec<ForecastPoint> = self
            .forecast
            .iter()
            .filter(|p| window.contains(&p.timestamp))
            .filter(|p| region.is_none_or(|r| p.geometry.intersects(&r.boundary)))
            .cloned()
            .collect();
        debug!("{} forecast points in {}", points.len(), window);
        Ok(points)
    }

    #[tracing::instrument(name = "fetch_asset_features", level = "debug", skip(self, region), fields(region = ?region.map(Region::label)))]
    async fn fetch_asset_features(
        &self,
        dataset: AssetDataset,
        region: Option<&Region>,
    ) -> Result<Vec<AssetFeature>> {
        let assets = self.assets(dataset);
        let features = match region {
            Some(region) => assets.within(&region.boundary),
            None => assets.features.clone(),
        };
        debug!("{} {} features", features.len(), dataset);
        Ok(features)
    }

    async fn lookup_region_boundary(
        &self,
        kind: RegionKind,
        name: &str,
        state: Option<&str>,
    ) -> Result<Vec<Region>> {
        let wanted = normalize_name(name);
        let state_code = match state {
            Some(text) => match lookup_state(text) {
                Some(s) => Some(s.code),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let pool = match kind {
            RegionKind::State => &self.states,
            RegionKind::County => &self.counties,
        };
        Ok(pool
            .iter()
            .filter(|r| normalize_name(&r.name) == wanted)
            .filter(|r| state_code.is_none_or(|code| r.state_code.eq_ignore_ascii_case(code)))
            .cloned()
            .collect())
    }
}

async fn read_features(path: &Path) -> Result<Vec<GeoJsonFeature>> {
    let context = path.display().to_string();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        GeoAssistError::dataset("read_dataset_file", context.as_str(), e.to_string())
    })?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        GeoAssistError::dataset("parse_geojson", context.as_str(), e.to_string())
    })?;
    parse_feature_collection(&value, &context)
}

fn boundary_of(feature: &GeoJsonFeature) -> Option<MultiPolygon<f64>> {
    match feature.geometry.as_ref()? {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

fn state_from_feature(feature: &GeoJsonFeature) -> Option<Region> {
    let boundary = boundary_of(feature)?;
    let name = feature.string_property(&["NAME", "name", "state_name"])?;
    let state = feature
        .string_property(&["STUSPS", "state_code"])
        .and_then(|code| state_by_code(&code))
        .or_else(|| lookup_state(&name))?;
    Some(Region {
        kind: RegionKind::State,
        name: state.name.to_string(),
        state_code: state.code.to_string(),
        fips: state.fips.to_string(),
        boundary,
    })
}

fn county_from_feature(feature: &GeoJsonFeature) -> Option<Region> {
    let boundary = boundary_of(feature)?;
    let name = feature.string_property(&["NAME", "name", "county_name"])?;
    let state_fips = feature.string_property(&["STATEFP", "state_fips_code"]);
    let state = feature
        .string_property(&["STUSPS", "state_code"])
        .and_then(|code| state_by_code(&code))
        .or_else(|| state_fips.as_deref().and_then(state_by_fips))?;
    let fips = feature
        .string_property(&["GEOID", "county_fips_code"])
        .or_else(|| {
            feature
                .string_property(&["COUNTYFP"])
                .map(|county| format!("{}{county}", state.fips))
        })
        .unwrap_or_default();
    let base = name
        .strip_suffix(" County")
        .or_else(|| name.strip_suffix(" Parish"))
        .unwrap_or(&name)
        .to_string();
    Some(Region {
        kind: RegionKind::County,
        name: base,
        state_code: state.code.to_string(),
        fips,
        boundary,
    })
}

fn forecast_from_feature(feature: &GeoJsonFeature, context: &str) -> Result<ForecastPoint> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| GeoAssistError::dataset("parse_forecast", context, "feature without geometry"))?;

    let (point, cell) = match geometry {
        Geometry::Point(p) => (*p, None),
        Geometry::Polygon(poly) => {
            let centroid = poly.centroid().ok_or_else(|| {
                GeoAssistError::dataset("parse_forecast", context, "empty forecast cell")
            })?;
            (centroid, Some(poly.clone()))
        }
        _ => {
            return Err(GeoAssistError::dataset(
                "parse_forecast",
                context,
                "forecast geometry must be a Point or Polygon",
            ));
        }
    };

    let timestamp = feature
        .string_property(&["timestamp", "valid_time", "forecast_timestamp"])
        .and_then(|text| DateTime::parse_from_rfc3339(&text).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| GeoAssistError::dataset("parse_forecast", context, "missing or invalid timestamp"))?;
    let init_date = feature
        .string_property(&["init_date"])
        .and_then(|text| NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok())
        .unwrap_or_else(|| timestamp.date_naive());

    let mut forecast = ForecastPoint::new(point, timestamp, init_date);
    forecast.cell = cell;
    for variable in [
        WeatherVariable::WindSpeed,
        WeatherVariable::WindGust,
        WeatherVariable::Temperature,
        WeatherVariable::Precipitation,
    ] {
        if let Some(value) = feature
            .property(&[variable.as_str()])
            .and_then(serde_json::Value::as_f64)
        {
            forecast.values.insert(variable, value);
        }
    }
    Ok(forecast)
}

fn assets_from_features(features: Vec<GeoJsonFeature>, prefix: &str) -> Vec<AssetFeature> {
    features
        .into_iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            let id = feature
                .id
                .as_ref()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .or_else(|| feature.string_property(&["ID", "id", "OBJECTID"]))
                .unwrap_or_else(|| format!("{prefix}-{idx}"));
            let geometry = feature.geometry?;
            Some(AssetFeature {
                id,
                geometry,
                attributes: feature.properties.into_iter().collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forecast::canonical_timestamps;
    use geo::{LineString, Point, Rect};
    use std::io::Write;

    fn square(min: (f64, f64), max: (f64, f64)) -> MultiPolygon<f64> {
        MultiPolygon(vec![Rect::new(min, max).to_polygon()])
    }

    fn county(name: &str, code: &str, fips: &str, min: (f64, f64), max: (f64, f64)) -> Region {
        Region {
            kind: RegionKind::County,
            name: name.to_string(),
            state_code: code.to_string(),
            fips: fips.to_string(),
            boundary: square(min, max),
        }
    }

    fn sample() -> StaticDatasets {
        let day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let stamps = canonical_timestamps(day, 1);
        StaticDatasets::new()
            .with_regions(vec![
                county("Crawford", "PA", "42039", (-80.5, 41.5), (-79.9, 41.9)),
                county("Crawford", "OH", "39033", (-83.1, 40.7), (-82.7, 41.0)),
            ])
            .with_forecast(vec![
                ForecastPoint::new(Point::new(-80.2, 41.7), stamps[0], day),
                ForecastPoint::new(Point::new(-82.9, 40.8), stamps[0], day),
                ForecastPoint::new(Point::new(-80.2, 41.7), stamps[1], day),
            ])
            .with_assets(
                AssetDataset::PowerLines,
                vec![
                    AssetFeature::new("pa-1", LineString::from(vec![(-80.4, 41.6), (-80.0, 41.8)])),
                    AssetFeature::new("oh-1", LineString::from(vec![(-83.0, 40.8), (-82.8, 40.9)])),
                ],
            )
    }

    #[tokio::test]
    async fn test_lookup_filters_by_state() {
        let data = sample();
        let all = data
            .lookup_region_boundary(RegionKind::County, "crawford county", None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let pa = data
            .lookup_region_boundary(RegionKind::County, "Crawford", Some("Pennsylvania"))
            .await
            .unwrap();
        assert_eq!(pa.len(), 1);
        assert_eq!(pa[0].fips, "42039");

        let none = data
            .lookup_region_boundary(RegionKind::County, "Crawford", Some("Narnia"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_forecast_filters_region_and_window() {
        let data = sample();
        let pa = &data
            .lookup_region_boundary(RegionKind::County, "Crawford", Some("PA"))
            .await
            .unwrap()[0];
        let day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let stamps = canonical_timestamps(day, 1);

        let points = data
            .fetch_forecast(Some(pa), TimeWindow::instant(stamps[0]))
            .await
            .unwrap();
        assert_eq!(points.len(), 1);

        let points = data.fetch_forecast(Some(pa), TimeWindow::days(day, 1)).await.unwrap();
        assert_eq!(points.len(), 2);

        let points = data.fetch_forecast(None, TimeWindow::unbounded()).await.unwrap();
        assert_eq!(points.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_assets_by_region() {
        let data = sample();
        let oh = &data
            .lookup_region_boundary(RegionKind::County, "Crawford", Some("OH"))
            .await
            .unwrap()[0];
        let lines = data
            .fetch_asset_features(AssetDataset::PowerLines, Some(oh))
            .await
            .unwrap();
        let ids: Vec<_> = lines.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["oh-1"]);

        let wells = data
            .fetch_asset_features(AssetDataset::OilWells, None)
            .await
            .unwrap();
        assert!(wells.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_geojson_files() {
        let dir = tempfile::tempdir().unwrap();
        let counties_path = dir.path().join("counties.geojson");
        let mut file = std::fs::File::create(&counties_path).unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature",
                "properties":{{"NAME":"Crawford","STATEFP":"42","GEOID":"42039"}},
                "geometry":{{"type":"Polygon","coordinates":[[[-80.5,41.5],[-79.9,41.5],[-79.9,41.9],[-80.5,41.9],[-80.5,41.5]]]}}}}]}}"#
        )
        .unwrap();

        let forecast_path = dir.path().join("forecast.geojson");
        std::fs::write(
            &forecast_path,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature",
                "properties":{"timestamp":"2025-01-10T06:00:00Z","wind_speed":10.5,"temperature":260.0},
                "geometry":{"type":"Point","coordinates":[-80.2,41.7]}}]}"#,
        )
        .unwrap();

        let config = DatasetConfig {
            counties_path: Some(counties_path),
            forecast_path: Some(forecast_path),
            ..DatasetConfig::default()
        };
        let data = StaticDatasets::load(&config).await.unwrap();

        let found = data
            .lookup_region_boundary(RegionKind::County, "Crawford County", Some("PA"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label(), "Crawford County, PA");

        let points = data.fetch_forecast(Some(&found[0]), TimeWindow::unbounded()).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value(WeatherVariable::WindSpeed), Some(10.5));
        assert!(points[0].value(WeatherVariable::WindGust).is_none());
    }

    #[tokio::test]
    async fn test_load_reports_missing_file() {
        let config = DatasetConfig {
            states_path: Some("/nonexistent/states.geojson".into()),
            ..DatasetConfig::default()
        };
        let err = StaticDatasets::load(&config).await.unwrap_err();
        assert!(matches!(err, GeoAssistError::DatasetAccess { .. }));
        assert!(err.to_string().contains("states.geojson"));
    }
}
