//! Forecast points, canonical forecast hours and time selection

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use geo::{Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three forecast hours (UTC) the datasets are published for
pub const CANONICAL_HOURS: [u32; 3] = [6, 12, 18];

/// Named variable carried by a forecast point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    WindSpeed,
    WindGust,
    /// Kelvin at the dataset boundary
    Temperature,
    /// Metres of water at the dataset boundary
    Precipitation,
}

impl WeatherVariable {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherVariable::WindSpeed => "wind_speed",
            WeatherVariable::WindGust => "wind_gust",
            WeatherVariable::Temperature => "temperature",
            WeatherVariable::Precipitation => "precipitation",
        }
    }

    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "wind_speed" | "wind" => Some(WeatherVariable::WindSpeed),
            "wind_gust" | "gust" => Some(WeatherVariable::WindGust),
            "temperature" | "temp" => Some(WeatherVariable::Temperature),
            "precipitation" | "precip" => Some(WeatherVariable::Precipitation),
            _ => None,
        }
    }

    /// Unit used when the variable is shown on a map
    #[must_use]
    pub fn display_unit(&self) -> &'static str {
        match self {
            WeatherVariable::WindSpeed | WeatherVariable::WindGust => "m/s",
            WeatherVariable::Temperature => "°C",
            WeatherVariable::Precipitation => "mm",
        }
    }

    /// Convert a raw dataset value into the display unit
    #[must_use]
    pub fn to_display(&self, raw: f64) -> f64 {
        match self {
            WeatherVariable::WindSpeed | WeatherVariable::WindGust => raw,
            WeatherVariable::Temperature => kelvin_to_celsius(raw),
            WeatherVariable::Precipitation => raw * 1000.0,
        }
    }
}

impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One spatial-temporal forecast observation
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    /// Grid point location
    pub geometry: Point<f64>,
    /// Influence cell of the grid point, when the dataset supplies one
    pub cell: Option<Polygon<f64>>,
    /// Valid time of the forecast
    pub timestamp: DateTime<Utc>,
    /// Model initialisation date
    pub init_date: NaiveDate,
    pub values: BTreeMap<WeatherVariable, f64>,
}

impl ForecastPoint {
    #[must_use]
    pub fn new(geometry: Point<f64>, timestamp: DateTime<Utc>, init_date: NaiveDate) -> Self {
        Self {
            geometry,
            cell: None,
            timestamp,
            init_date,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, variable: WeatherVariable, value: f64) -> Self {
        self.values.insert(variable, value);
        self
    }

    #[must_use]
    pub fn with_cell(mut self, cell: Polygon<f64>) -> Self {
        self.cell = Some(cell);
        self
    }

    #[must_use]
    pub fn value(&self, variable: WeatherVariable) -> Option<f64> {
        self.values.get(&variable).copied().filter(|v| v.is_finite())
    }

    /// Wind used for risk: gust when present, sustained speed otherwise
    #[must_use]
    pub fn wind(&self) -> Option<f64> {
        self.value(WeatherVariable::WindGust)
            .or_else(|| self.value(WeatherVariable::WindSpeed))
    }

    /// Stable identifier of the grid cell, shared across timestamps
    #[must_use]
    pub fn cell_id(&self) -> String {
        format!("cell:{:.4}:{:.4}", self.geometry.y(), self.geometry.x())
    }

    /// Polygon representing this point's influence area
    #[must_use]
    pub fn cell_polygon(&self, half_size_deg: f64) -> Polygon<f64> {
        if let Some(cell) = &self.cell {
            return cell.clone();
        }
        let (x, y) = (self.geometry.x(), self.geometry.y());
        Rect::new(
            (x - half_size_deg, y - half_size_deg),
            (x + half_size_deg, y + half_size_deg),
        )
        .to_polygon()
    }
}

/// Half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Every available timestamp
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Whole UTC days starting at `start`
    #[must_use]
    pub fn days(start: NaiveDate, days: u32) -> Self {
        let begin = start_of_day(start);
        let end = start
            .checked_add_days(Days::new(u64::from(days)))
            .map_or(DateTime::<Utc>::MAX_UTC, start_of_day);
        Self { start: begin, end }
    }

    /// Exactly one timestamp
    #[must_use]
    pub fn instant(timestamp: DateTime<Utc>) -> Self {
        Self {
            start: timestamp,
            end: timestamp + chrono::Duration::seconds(1),
        }
    }

    #[must_use]
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        *timestamp >= self.start && *timestamp < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::unbounded() {
            return f.write_str("all timestamps");
        }
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%dT%H:%MZ"),
            self.end.format("%Y-%m-%dT%H:%MZ")
        )
    }
}

/// Which forecast time an action asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TimeSelection {
    /// Latest available date, aggregated over the day
    Latest,
    /// A whole day, aggregated over its canonical hours
    Date(NaiveDate),
    /// A single canonical forecast hour
    Timestamp(DateTime<Utc>),
}

impl TimeSelection {
    #[must_use]
    pub fn is_single_timestamp(&self) -> bool {
        matches!(self, TimeSelection::Timestamp(_))
    }
}

#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// True when `timestamp` is one of the canonical forecast hours
#[must_use]
pub fn is_canonical(timestamp: &DateTime<Utc>) -> bool {
    CANONICAL_HOURS.contains(&timestamp.hour())
        && timestamp.minute() == 0
        && timestamp.second() == 0
        && timestamp.nanosecond() == 0
}

/// Canonical timestamps for `days` days starting at `start`, ascending
#[must_use]
pub fn canonical_timestamps(start: NaiveDate, days: u32) -> Vec<DateTime<Utc>> {
    (0..days)
        .filter_map(|offset| start.checked_add_days(Days::new(u64::from(offset))))
        .flat_map(|date| {
            CANONICAL_HOURS.iter().filter_map(move |&hour| {
                date.and_hms_opt(hour, 0, 0)
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
        })
        .collect()
}

#[must_use]
pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    (kelvin - 273.15) * 9.0 / 5.0 + 32.0
}

#[must_use]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_kelvin_to_fahrenheit_is_exact() {
        assert_eq!(kelvin_to_fahrenheit(273.15), 32.0);
        assert_eq!(kelvin_to_fahrenheit(293.15), 68.0);
    }

    #[test]
    fn test_canonical_timestamps() {
        let stamps = canonical_timestamps(date(2025, 1, 10), 2);
        let hours: Vec<_> = stamps.iter().map(|t| (t.day(), t.hour())).collect();
        assert_eq!(hours, vec![(10, 6), (10, 12), (10, 18), (11, 6), (11, 12), (11, 18)]);
        assert!(stamps.iter().all(is_canonical));
        assert!(canonical_timestamps(date(2025, 1, 10), 0).is_empty());
    }

    #[rstest]
    #[case("2025-01-10T06:00:00Z", true)]
    #[case("2025-01-10T12:00:00Z", true)]
    #[case("2025-01-10T18:00:00Z", true)]
    #[case("2025-01-10T00:00:00Z", false)]
    #[case("2025-01-10T12:30:00Z", false)]
    #[case("2025-01-10T12:00:05Z", false)]
    fn test_is_canonical(#[case] text: &str, #[case] expected: bool) {
        let ts = DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc);
        assert_eq!(is_canonical(&ts), expected);
    }

    #[test]
    fn test_time_window_days() {
        let window = TimeWindow::days(date(2025, 1, 10), 1);
        let inside = canonical_timestamps(date(2025, 1, 10), 1);
        assert!(inside.iter().all(|t| window.contains(t)));
        assert!(!window.contains(&start_of_day(date(2025, 1, 11))));
        assert!(TimeWindow::unbounded().contains(&start_of_day(date(1999, 1, 1))));
    }

    #[test]
    fn test_wind_prefers_gust() {
        let ts = start_of_day(date(2025, 1, 10));
        let point = ForecastPoint::new(Point::new(-89.0, 40.0), ts, date(2025, 1, 10))
            .with_value(WeatherVariable::WindSpeed, 7.0);
        assert_eq!(point.wind(), Some(7.0));

        let point = point.with_value(WeatherVariable::WindGust, 12.0);
        assert_eq!(point.wind(), Some(12.0));

        let point = point.with_value(WeatherVariable::WindGust, f64::NAN);
        assert_eq!(point.wind(), Some(7.0));
    }

    #[test]
    fn test_cell_polygon_defaults_to_square() {
        use geo::{Area, Contains};
        let ts = start_of_day(date(2025, 1, 10));
        let point = ForecastPoint::new(Point::new(-89.0, 40.0), ts, date(2025, 1, 10));
        let cell = point.cell_polygon(0.125);
        assert!((cell.unsigned_area() - 0.0625).abs() < 1e-12);
        assert!(cell.contains(&Point::new(-89.1, 40.1)));
        assert_eq!(point.cell_id(), "cell:40.0000:-89.0000");
    }

    #[rstest]
    #[case(WeatherVariable::Temperature, 293.15, 20.0)]
    #[case(WeatherVariable::Precipitation, 0.002, 2.0)]
    #[case(WeatherVariable::WindSpeed, 11.0, 11.0)]
    fn test_display_conversion(#[case] var: WeatherVariable, #[case] raw: f64, #[case] shown: f64) {
        assert!((var.to_display(raw) - shown).abs() < 1e-9);
    }
}
