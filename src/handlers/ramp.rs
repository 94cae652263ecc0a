//! Linear colour ramps for continuous values

use crate::models::WeatherVariable;

/// Colour stops spread evenly between `min` and `max`
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: &'static [&'static str],
    pub min: f64,
    pub max: f64,
}

const TEMPERATURE: &[&str] = &["#0000ff", "#00ffff", "#00ff00", "#ffff00", "#ff0000"];
const PRECIPITATION: &[&str] = &["#ffffff", "#c6dbef", "#9ecae1", "#6baed6", "#3182bd", "#08519c"];
const WIND: &[&str] = &["#ffffff", "#c7e9c0", "#a1d99b", "#74c476", "#31a354", "#006d2c"];
const COLD: &[&str] = &["#08306b", "#2171b5", "#4292c6", "#6baed6", "#9ecae1", "#c6dbef"];
const WIND_RISK: &[&str] = &["#fee8c8", "#fdbb84", "#e34a33"];

impl ColorRamp {
    /// Ramp between `min` and `max`; an empty range is widened by one unit each way
    #[must_use]
    pub fn new(stops: &'static [&'static str], min: f64, max: f64) -> Self {
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 1.0, max + 1.0)
        } else {
            (min.min(max), min.max(max))
        };
        Self { stops, min, max }
    }

    #[must_use]
    pub fn for_variable(variable: WeatherVariable, min: f64, max: f64) -> Self {
        let stops = match variable {
            WeatherVariable::Temperature => TEMPERATURE,
            WeatherVariable::Precipitation => PRECIPITATION,
            WeatherVariable::WindSpeed | WeatherVariable::WindGust => WIND,
        };
        Self::new(stops, min, max)
    }

    /// Dark blue at the coldest value, pale blue at the threshold
    #[must_use]
    pub fn cold(coldest: f64, threshold: f64) -> Self {
        Self::new(COLD, coldest, threshold)
    }

    /// Wind risk score, 0..=100
    #[must_use]
    pub fn wind_risk() -> Self {
        Self::new(WIND_RISK, 0.0, 100.0)
    }

    /// Hex colour for `value`, clamped to the ramp's range
    #[must_use]
    pub fn color(&self, value: f64) -> String {
        let stops = self.stops;
        if stops.len() < 2 {
            return stops.first().map_or_else(|| "#000000".to_string(), |s| (*s).to_string());
        }
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        #[allow(clippy::cast_precision_loss)]
        let position = t * (stops.len() - 1) as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lower = (position.floor() as usize).min(stops.len() - 2);
        let fraction = position - lower as f64;

        let (r1, g1, b1) = parse_hex(stops[lower]);
        let (r2, g2, b2) = parse_hex(stops[lower + 1]);
        format!(
            "#{:02x}{:02x}{:02x}",
            blend(r1, r2, fraction),
            blend(g1, g2, fraction),
            blend(b1, b2, fraction)
        )
    }

    #[must_use]
    pub fn stops(&self) -> &'static [&'static str] {
        self.stops
    }
}

fn parse_hex(color: &str) -> (u8, u8, u8) {
    let hex = color.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    (channel(0..2), channel(2..4), channel(4..6))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(a: u8, b: u8, fraction: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * fraction).round() as u8
}
