//! Validation and defaulting of raw action payloads
//!
//! Turns the loosely-typed JSON emitted upstream into an [`Action`]. Field
//! names are part of the external contract and are read exactly as sent.

use crate::Result;
use crate::error::{GeoAssistError, ValidationKind};
use crate::models::action::{
    AddCircle, AddHeatmap, AddLine, AddMarker, AddPolygon, AnalyzeWindRisk, FitBounds, HeatPoint,
    HighlightRegion, ShowLocalDataset, ShowWeather, UnsafeTemperature,
};
use crate::models::forecast::is_canonical;
use crate::models::region::lookup_state;
use crate::models::{
    Action, ActionType, AssetDataset, LatLon, RegionKind, StyleOverrides, TimeSelection,
    WeatherVariable,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const DEFAULT_HIGH_THRESHOLD: f64 = 15.0;
pub const DEFAULT_MODERATE_THRESHOLD: f64 = 9.0;
pub const DEFAULT_MIN_TEMP_F: f64 = 20.0;
pub const DEFAULT_CIRCLE_RADIUS_M: f64 = 1000.0;
pub const DEFAULT_HEATMAP_RADIUS: f64 = 15.0;
pub const DEFAULT_HEATMAP_BLUR: f64 = 10.0;

type Fields = Map<String, Value>;

/// Action normalizer bound to the region that has oil well coverage
#[derive(Debug, Clone)]
pub struct Normalizer {
    oil_well_region: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("North Dakota")
    }
}

/// Normalize with the default oil well region
pub fn normalize(raw_action: &Value) -> Result<Action> {
    Normalizer::default().normalize(raw_action)
}

impl Normalizer {
    pub fn new<S: Into<String>>(oil_well_region: S) -> Self {
        Self {
            oil_well_region: oil_well_region.into(),
        }
    }

    #[tracing::instrument(name = "normalize_action", level = "debug", skip(self, raw_action))]
    pub fn normalize(&self, raw_action: &Value) -> Result<Action> {
        let fields = raw_action.as_object().ok_or_else(|| {
            invalid(ValidationKind::InvalidField, "action must be a JSON object")
        })?;

        let action_type = match fields.get("action_type") {
            Some(Value::String(name)) => ActionType::parse(name.trim()).ok_or_else(|| {
                invalid(
                    ValidationKind::UnknownActionType,
                    format!("unsupported action_type '{name}'"),
                )
            })?,
            Some(_) => {
                return Err(invalid(
                    ValidationKind::UnknownActionType,
                    "action_type must be a string",
                ));
            }
            None => {
                return Err(invalid(
                    ValidationKind::UnknownActionType,
                    "action_type is missing",
                ));
            }
        };
        debug!(%action_type, "Normalizing action");

        let action = match action_type {
            ActionType::ShowWeather => Action::ShowWeather(show_weather(fields)?),
            ActionType::ShowLocalDataset => Action::ShowLocalDataset(show_local_dataset(fields)?),
            ActionType::AnalyzeWindRisk => Action::AnalyzeWindRisk(analyze_wind_risk(fields)?),
            ActionType::UnsafeTemperature => {
                Action::UnsafeTemperature(self.unsafe_temperature(fields)?)
            }
            ActionType::HighlightRegion => Action::HighlightRegion(highlight_region(fields)?),
            ActionType::AddMarker => Action::AddMarker(AddMarker {
                location: lat_lon(fields)?,
                popup: opt_str(fields, "popup")?,
                style: style(fields)?,
            }),
            ActionType::AddCircle => Action::AddCircle(add_circle(fields)?),
            ActionType::AddLine => Action::AddLine(AddLine {
                locations: locations(fields, 2)?,
                popup: opt_str(fields, "popup")?,
                dash_array: opt_str(fields, "dash_array")?,
                style: style(fields)?,
            }),
            ActionType::AddPolygon => Action::AddPolygon(AddPolygon {
                locations: locations(fields, 3)?,
                popup: opt_str(fields, "popup")?,
                style: style(fields)?,
            }),
            ActionType::AddHeatmap => Action::AddHeatmap(add_heatmap(fields)?),
            ActionType::FitBounds => Action::FitBounds(fit_bounds(fields)?),
        };
        Ok(action)
    }

    fn unsafe_temperature(&self, fields: &Fields) -> Result<UnsafeTemperature> {
        let region = opt_str(fields, "region")?.unwrap_or_else(|| self.oil_well_region.clone());
        let requested_wells = opt_bool(fields, "show_oil_wells")?;
        let covered = match (lookup_state(&region), lookup_state(&self.oil_well_region)) {
            (Some(a), Some(b)) => a.code == b.code,
            _ => region.eq_ignore_ascii_case(&self.oil_well_region),
        };

        let show_oil_wells = requested_wells.unwrap_or(true) && covered;
        let oil_wells_demoted = requested_wells == Some(true) && !covered;
        if oil_wells_demoted {
            warn!(
                region = %region,
                "Oil well data is only available for {}; show_oil_wells ignored",
                self.oil_well_region
            );
        }

        Ok(UnsafeTemperature {
            region,
            min_temp_f: opt_f64(fields, "min_temp_f")?.unwrap_or(DEFAULT_MIN_TEMP_F),
            show_oil_wells,
            oil_wells_demoted,
            time: time_selection(fields)?,
        })
    }
}

fn show_weather(fields: &Fields) -> Result<ShowWeather> {
    let parameter = match opt_str(fields, "parameter")? {
        Some(text) => WeatherVariable::parse(&text).ok_or_else(|| {
            invalid(
                ValidationKind::InvalidField,
                format!("unsupported weather parameter '{text}'"),
            )
        })?,
        None => WeatherVariable::Temperature,
    };
    let region = match opt_str(fields, "region")? {
        Some(region) => Some(region),
        None => opt_str(fields, "location")?,
    };
    Ok(ShowWeather {
        parameter,
        time: time_selection(fields)?,
        region,
    })
}

fn show_local_dataset(fields: &Fields) -> Result<ShowLocalDataset> {
    let name = opt_str(fields, "dataset_name")?
        .ok_or_else(|| invalid(ValidationKind::MissingField, "dataset_name is required"))?;
    let dataset = AssetDataset::parse(&name).ok_or_else(|| {
        invalid(
            ValidationKind::UnknownDataset,
            format!("unknown dataset '{name}'"),
        )
    })?;
    let region = opt_str(fields, "region")?;
    if dataset.requires_region() && region.is_none() {
        return Err(invalid(
            ValidationKind::MissingRegion,
            format!("region is required for dataset {dataset}"),
        ));
    }
    Ok(ShowLocalDataset {
        dataset,
        region,
        style: style(fields)?,
    })
}

fn analyze_wind_risk(fields: &Fields) -> Result<AnalyzeWindRisk> {
    let region = opt_str(fields, "region")?.ok_or_else(|| {
        invalid(
            ValidationKind::MissingRegion,
            "region is required for analyze_wind_risk",
        )
    })?;
    let high_threshold = opt_f64(fields, "high_threshold")?.unwrap_or(DEFAULT_HIGH_THRESHOLD);
    let moderate_threshold =
        opt_f64(fields, "moderate_threshold")?.unwrap_or(DEFAULT_MODERATE_THRESHOLD);
    if moderate_threshold <= 0.0 || high_threshold <= 0.0 {
        return Err(invalid(
            ValidationKind::InvalidField,
            "wind thresholds must be positive",
        ));
    }
    if moderate_threshold > high_threshold {
        return Err(invalid(
            ValidationKind::InvalidField,
            format!(
                "moderate_threshold ({moderate_threshold}) exceeds high_threshold ({high_threshold})"
            ),
        ));
    }
    Ok(AnalyzeWindRisk {
        region,
        forecast_days: opt_u32(fields, "forecast_days")?,
        high_threshold,
        moderate_threshold,
        analyze_power_lines: opt_bool(fields, "analyze_power_lines")?.unwrap_or(false),
    })
}

fn highlight_region(fields: &Fields) -> Result<HighlightRegion> {
    let name = match opt_str(fields, "region_name")? {
        Some(name) => Some(name),
        None => opt_str(fields, "region")?,
    }
    .ok_or_else(|| invalid(ValidationKind::MissingRegion, "region_name is required"))?;

    let region_type = match opt_str(fields, "region_type")? {
        Some(text) => Some(RegionKind::parse(&text).ok_or_else(|| {
            invalid(
                ValidationKind::InvalidField,
                format!("unsupported region_type '{text}'"),
            )
        })?),
        None => None,
    };

    // "Fulton" + state_name "Georgia" reads as "Fulton, Georgia"
    let region = match opt_str(fields, "state_name")? {
        Some(state) if !name.contains(',') && region_type != Some(RegionKind::State) => {
            format!("{name}, {state}")
        }
        _ => name,
    };

    Ok(HighlightRegion {
        region,
        region_type,
        style: style(fields)?,
    })
}

fn add_circle(fields: &Fields) -> Result<AddCircle> {
    let radius = opt_f64(fields, "radius")?.unwrap_or(DEFAULT_CIRCLE_RADIUS_M);
    if radius <= 0.0 {
        return Err(invalid(ValidationKind::InvalidField, "radius must be positive"));
    }
    Ok(AddCircle {
        location: lat_lon(fields)?,
        radius,
        popup: opt_str(fields, "popup")?,
        style: style(fields)?,
    })
}

fn add_heatmap(fields: &Fields) -> Result<AddHeatmap> {
    let raw = fields
        .get("data_points")
        .and_then(Value::as_array)
        .filter(|points| !points.is_empty())
        .ok_or_else(|| invalid(ValidationKind::MissingField, "data_points is required"))?;
    let points = raw
        .iter()
        .map(|entry| {
            let values = number_array(entry, "data_points")?;
            match values.as_slice() {
                [lat, lon] => Ok(HeatPoint {
                    location: checked_lat_lon(*lat, *lon)?,
                    intensity: 1.0,
                }),
                [lat, lon, intensity, ..] => Ok(HeatPoint {
                    location: checked_lat_lon(*lat, *lon)?,
                    intensity: *intensity,
                }),
                _ => Err(invalid(
                    ValidationKind::InvalidField,
                    "data_points entries must be [lat, lon] or [lat, lon, intensity]",
                )),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(AddHeatmap {
        points,
        radius: opt_f64(fields, "radius")?.unwrap_or(DEFAULT_HEATMAP_RADIUS),
        blur: opt_f64(fields, "blur")?.unwrap_or(DEFAULT_HEATMAP_BLUR),
    })
}

fn fit_bounds(fields: &Fields) -> Result<FitBounds> {
    let corners = fields
        .get("bounds")
        .ok_or_else(|| invalid(ValidationKind::MissingField, "bounds is required"))?;
    let corners = pairs(corners, "bounds")?;
    match corners.as_slice() {
        [sw, ne] => {
            if sw.lat > ne.lat {
                return Err(invalid(
                    ValidationKind::InvalidField,
                    "bounds must be [[south, west], [north, east]]",
                ));
            }
            Ok(FitBounds {
                south_west: *sw,
                north_east: *ne,
            })
        }
        _ => Err(invalid(
            ValidationKind::InvalidField,
            "bounds must contain exactly two corners",
        )),
    }
}

/// `forecast_date` XOR `forecast_timestamp`; neither means latest
fn time_selection(fields: &Fields) -> Result<TimeSelection> {
    let date = opt_str(fields, "forecast_date")?;
    let timestamp = opt_str(fields, "forecast_timestamp")?;
    match (date, timestamp) {
        (Some(_), Some(_)) => Err(invalid(
            ValidationKind::ConflictingTime,
            "give either forecast_date or forecast_timestamp, not both",
        )),
        (Some(date), None) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map(TimeSelection::Date)
            .map_err(|_| {
                invalid(
                    ValidationKind::InvalidDate,
                    format!("forecast_date '{date}' is not YYYY-MM-DD"),
                )
            }),
        (None, Some(text)) => parse_canonical_timestamp(&text).map(TimeSelection::Timestamp),
        (None, None) => Ok(TimeSelection::Latest),
    }
}

/// Parse an ISO-8601 UTC timestamp that must land on a canonical forecast hour
pub fn parse_canonical_timestamp(text: &str) -> Result<DateTime<Utc>> {
    if !text.ends_with('Z') {
        return Err(invalid(
            ValidationKind::InvalidTimestamp,
            format!("forecast_timestamp '{text}' must be UTC with a Z suffix"),
        ));
    }
    let timestamp = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            invalid(
                ValidationKind::InvalidTimestamp,
                format!("forecast_timestamp '{text}' is not ISO-8601"),
            )
        })?;
    if !is_canonical(&timestamp) {
        return Err(invalid(
            ValidationKind::InvalidTimestamp,
            format!("forecast_timestamp '{text}' must be at 06:00, 12:00 or 18:00 UTC"),
        ));
    }
    Ok(timestamp)
}

fn style(fields: &Fields) -> Result<StyleOverrides> {
    Ok(StyleOverrides {
        color: opt_str(fields, "color")?,
        fill_color: opt_str(fields, "fill_color")?,
        weight: opt_f64(fields, "weight")?,
        opacity: opt_f64(fields, "opacity")?,
        fill_opacity: opt_f64(fields, "fill_opacity")?,
    })
}

fn lat_lon(fields: &Fields) -> Result<LatLon> {
    let lat = opt_f64(fields, "lat")?
        .ok_or_else(|| invalid(ValidationKind::MissingField, "lat is required"))?;
    let lon = opt_f64(fields, "lon")?
        .ok_or_else(|| invalid(ValidationKind::MissingField, "lon is required"))?;
    checked_lat_lon(lat, lon)
}

fn checked_lat_lon(lat: f64, lon: f64) -> Result<LatLon> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid(
            ValidationKind::InvalidField,
            format!("coordinate ({lat}, {lon}) is out of range"),
        ));
    }
    Ok(LatLon { lat, lon })
}

fn locations(fields: &Fields, minimum: usize) -> Result<Vec<LatLon>> {
    let raw = fields
        .get("locations")
        .ok_or_else(|| invalid(ValidationKind::MissingField, "locations is required"))?;
    let points = pairs(raw, "locations")?;
    if points.len() < minimum {
        return Err(invalid(
            ValidationKind::InvalidField,
            format!("locations needs at least {minimum} points"),
        ));
    }
    Ok(points)
}

/// `[[lat, lon], ...]`
fn pairs(value: &Value, field: &str) -> Result<Vec<LatLon>> {
    let entries = value.as_array().ok_or_else(|| {
        invalid(
            ValidationKind::InvalidField,
            format!("{field} must be a list of [lat, lon] pairs"),
        )
    })?;
    entries
        .iter()
        .map(|entry| match number_array(entry, field)?.as_slice() {
            [lat, lon] => checked_lat_lon(*lat, *lon),
            _ => Err(invalid(
                ValidationKind::InvalidField,
                format!("{field} entries must be [lat, lon]"),
            )),
        })
        .collect()
}

fn number_array(value: &Value, field: &str) -> Result<Vec<f64>> {
    value
        .as_array()
        .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
        .filter(|items| items.iter().all(|v| v.is_finite()))
        .ok_or_else(|| {
            invalid(
                ValidationKind::InvalidField,
                format!("{field} entries must be arrays of numbers"),
            )
        })
}

/// Absent, null and blank strings all count as unset
fn opt_str(fields: &Fields, key: &str) -> Result<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(invalid(
            ValidationKind::InvalidField,
            format!("{key} must be a string"),
        )),
    }
}

fn opt_f64(fields: &Fields, key: &str) -> Result<Option<f64>> {
    let value = match fields.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(invalid(
            ValidationKind::InvalidField,
            format!("{key} must be a number"),
        )),
    }
}

fn opt_u32(fields: &Fields, key: &str) -> Result<Option<u32>> {
    match opt_f64(fields, key)? {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => {
            // Integral and in range
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let days = v as u32;
            Ok(Some(days))
        }
        Some(_) => Err(invalid(
            ValidationKind::InvalidField,
            format!("{key} must be a non-negative whole number"),
        )),
    }
}

fn opt_bool(fields: &Fields, key: &str) -> Result<Option<bool>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(_) => Err(invalid(
            ValidationKind::InvalidField,
            format!("{key} must be a boolean"),
        )),
    }
}

fn invalid<S: Into<String>>(kind: ValidationKind, message: S) -> GeoAssistError {
    GeoAssistError::validation(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn kind_of(raw: Value) -> Option<ValidationKind> {
        normalize(&raw).unwrap_err().validation_kind()
    }

    #[rstest]
    #[case(json!({"action_type": "analyze_wind_risk"}))]
    #[case(json!({"action_type": "analyze_wind_risk", "region": ""}))]
    #[case(json!({"action_type": "analyze_wind_risk", "region": null, "analyze_power_lines": true}))]
    #[case(json!({"action_type": "show_local_dataset", "dataset_name": "power_lines"}))]
    #[case(json!({"action_type": "show_local_dataset", "dataset_name": "pa_power_lines", "region": "  "}))]
    fn test_missing_region_is_rejected(#[case] raw: Value) {
        assert_eq!(kind_of(raw), Some(ValidationKind::MissingRegion));
    }

    #[test]
    fn test_oil_wells_dataset_needs_no_region() {
        let action = normalize(&json!({"action_type": "show_local_dataset", "dataset_name": "oil_wells"}))
            .unwrap();
        let Action::ShowLocalDataset(dataset) = action else {
            panic!("wrong variant");
        };
        assert_eq!(dataset.dataset, AssetDataset::OilWells);
        assert!(dataset.region.is_none());
    }

    #[rstest]
    #[case(json!({"action_type": "teleport"}), ValidationKind::UnknownActionType)]
    #[case(json!({"region": "Illinois"}), ValidationKind::UnknownActionType)]
    #[case(json!({"action_type": 3}), ValidationKind::UnknownActionType)]
    #[case(json!({"action_type": "show_local_dataset", "dataset_name": "flood_zones"}), ValidationKind::UnknownDataset)]
    #[case(json!({"action_type": "show_local_dataset"}), ValidationKind::MissingField)]
    #[case(json!({"action_type": "add_marker", "lat": 41.0}), ValidationKind::MissingField)]
    #[case(json!({"action_type": "add_marker", "lat": 141.0, "lon": 0.0}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "add_line", "locations": [[41.0, -87.0]]}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "add_polygon", "locations": [[1, 2], [3, 4]]}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "add_polygon", "locations": "nope"}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "fit_bounds", "bounds": [[40, -90]]}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "add_heatmap", "data_points": []}), ValidationKind::MissingField)]
    #[case(json!({"action_type": "show_weather", "parameter": "humidity"}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "highlight_region", "region_name": "30303", "region_type": "zipcode"}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "analyze_wind_risk", "region": "Ohio", "high_threshold": 5.0}), ValidationKind::InvalidField)]
    #[case(json!({"action_type": "analyze_wind_risk", "region": "Ohio", "forecast_days": 2.5}), ValidationKind::InvalidField)]
    fn test_validation_kinds(#[case] raw: Value, #[case] expected: ValidationKind) {
        assert_eq!(kind_of(raw), Some(expected));
    }

    #[test]
    fn test_wind_risk_defaults() {
        let action = normalize(&json!({"action_type": "analyze_wind_risk", "region": "Illinois"})).unwrap();
        let Action::AnalyzeWindRisk(wind) = action else {
            panic!("wrong variant");
        };
        assert_eq!(wind.high_threshold, 15.0);
        assert_eq!(wind.moderate_threshold, 9.0);
        assert_eq!(wind.forecast_days, None);
        assert!(!wind.analyze_power_lines);
    }

    #[rstest]
    #[case(json!({"forecast_date": "2025-01-10"}), Ok(TimeSelection::Date(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())))]
    #[case(json!({}), Ok(TimeSelection::Latest))]
    #[case(json!({"forecast_date": "", "forecast_timestamp": ""}), Ok(TimeSelection::Latest))]
    #[case(json!({"forecast_date": "2025-01-10", "forecast_timestamp": "2025-01-10T06:00:00Z"}), Err(ValidationKind::ConflictingTime))]
    #[case(json!({"forecast_date": "01/10/2025"}), Err(ValidationKind::InvalidDate))]
    #[case(json!({"forecast_timestamp": "2025-01-10T09:00:00Z"}), Err(ValidationKind::InvalidTimestamp))]
    #[case(json!({"forecast_timestamp": "2025-01-10T06:30:00Z"}), Err(ValidationKind::InvalidTimestamp))]
    #[case(json!({"forecast_timestamp": "2025-01-10T06:00:00+00:00"}), Err(ValidationKind::InvalidTimestamp))]
    #[case(json!({"forecast_timestamp": "yesterday Z"}), Err(ValidationKind::InvalidTimestamp))]
    fn test_time_selection(
        #[case] time: Value,
        #[case] expected: std::result::Result<TimeSelection, ValidationKind>,
    ) {
        let mut raw = json!({"action_type": "unsafe_temperature", "region": "North Dakota"});
        if let (Some(target), Some(extra)) = (raw.as_object_mut(), time.as_object()) {
            target.extend(extra.clone());
        }
        let result = normalize(&raw).map(|action| match action {
            Action::UnsafeTemperature(t) => t.time,
            _ => panic!("wrong variant"),
        });
        match (result, expected) {
            (Ok(actual), Ok(expected)) => assert_eq!(actual, expected),
            (Err(err), Err(kind)) => assert_eq!(err.validation_kind(), Some(kind)),
            (other, expected) => panic!("got {other:?}, expected {expected:?}"),
        }
    }

    #[test]
    fn test_canonical_timestamp_accepted() {
        let ts = parse_canonical_timestamp("2025-01-10T18:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-01-10T18:00:00+00:00");
    }

    #[rstest]
    #[case("North Dakota", Some(true), true, false)]
    #[case("north dakota", None, true, false)]
    #[case("ND", Some(true), true, false)]
    #[case("Texas", Some(true), false, true)]
    #[case("Texas", None, false, false)]
    #[case("North Dakota", Some(false), false, false)]
    fn test_oil_wells_only_in_north_dakota(
        #[case] region: &str,
        #[case] requested: Option<bool>,
        #[case] shown: bool,
        #[case] demoted: bool,
    ) {
        let mut raw = json!({"action_type": "unsafe_temperature", "region": region});
        if let Some(requested) = requested {
            raw["show_oil_wells"] = json!(requested);
        }
        let Action::UnsafeTemperature(temp) = normalize(&raw).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(temp.show_oil_wells, shown);
        assert_eq!(temp.oil_wells_demoted, demoted);
        assert_eq!(temp.min_temp_f, 20.0);
    }

    #[test]
    fn test_unsafe_temperature_defaults_to_oil_well_region() {
        let Action::UnsafeTemperature(temp) =
            Normalizer::new("Texas").normalize(&json!({"action_type": "unsafe_temperature"})).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(temp.region, "Texas");
        assert!(temp.show_oil_wells);
    }

    #[test]
    fn test_highlight_region_aliases() {
        let action = normalize(&json!({
            "action_type": "highlight_region",
            "region_name": "Fulton",
            "region_type": "county",
            "state_name": "Georgia",
            "fill_color": "orange",
            "fill_opacity": "0.3"
        }))
        .unwrap();
        let Action::HighlightRegion(highlight) = action else {
            panic!("wrong variant");
        };
        assert_eq!(highlight.region, "Fulton, Georgia");
        assert_eq!(highlight.region_type, Some(RegionKind::County));
        assert_eq!(highlight.style.fill_color.as_deref(), Some("orange"));
        assert_eq!(highlight.style.fill_opacity, Some(0.3));
    }

    #[test]
    fn test_show_weather_location_alias() {
        let Action::ShowWeather(weather) = normalize(&json!({
            "action_type": "show_weather",
            "parameter": "wind_speed",
            "location": "Cook County, IL"
        }))
        .unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(weather.parameter, WeatherVariable::WindSpeed);
        assert_eq!(weather.region.as_deref(), Some("Cook County, IL"));
        assert_eq!(weather.time, TimeSelection::Latest);
    }

    #[test]
    fn test_drawing_defaults() {
        let Action::AddCircle(circle) =
            normalize(&json!({"action_type": "add_circle", "lat": 41.9, "lon": -87.6})).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(circle.radius, 1000.0);

        let Action::AddHeatmap(heat) = normalize(&json!({
            "action_type": "add_heatmap",
            "data_points": [[41.9, -87.6], [40.7, -74.0, 3.5]]
        }))
        .unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(heat.radius, 15.0);
        assert_eq!(heat.blur, 10.0);
        assert_eq!(heat.points[0].intensity, 1.0);
        assert_eq!(heat.points[1].intensity, 3.5);
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = json!({"action_type": "analyze_wind_risk", "region": "Illinois", "forecast_days": 5});
        let before = raw.clone();
        assert_eq!(normalize(&raw).unwrap(), normalize(&raw).unwrap());
        assert_eq!(raw, before);
    }
}
