//! Static city to county table used to pre-resolve city names

use crate::models::region::lookup_state;

/// A major US city and the county containing it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub county: &'static str,
    pub state_code: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub population: u64,
}

impl City {
    /// Region text the resolver understands, e.g. "Cook County, IL"
    #[must_use]
    pub fn county_region(&self) -> String {
        format!("{} County, {}", self.county, self.state_code)
    }
}

const CITIES: &[City] = &[
    City { name: "New York", county: "New York", state_code: "NY", lat: 40.7128, lon: -74.0060, population: 8_419_000 },
    City { name: "Los Angeles", county: "Los Angeles", state_code: "CA", lat: 34.0522, lon: -118.2437, population: 3_980_000 },
    City { name: "Chicago", county: "Cook", state_code: "IL", lat: 41.8781, lon: -87.6298, population: 2_716_000 },
    City { name: "Houston", county: "Harris", state_code: "TX", lat: 29.7604, lon: -95.3698, population: 2_328_000 },
    City { name: "Phoenix", county: "Maricopa", state_code: "AZ", lat: 33.4484, lon: -112.0740, population: 1_680_000 },
    City { name: "Philadelphia", county: "Philadelphia", state_code: "PA", lat: 39.9526, lon: -75.1652, population: 1_584_000 },
    City { name: "San Antonio", county: "Bexar", state_code: "TX", lat: 29.4241, lon: -98.4936, population: 1_547_000 },
    City { name: "San Diego", county: "San Diego", state_code: "CA", lat: 32.7157, lon: -117.1611, population: 1_427_000 },
    City { name: "Dallas", county: "Dallas", state_code: "TX", lat: 32.7767, lon: -96.7970, population: 1_345_000 },
    City { name: "San Jose", county: "Santa Clara", state_code: "CA", lat: 37.3382, lon: -121.8863, population: 1_031_000 },
    City { name: "Boston", county: "Suffolk", state_code: "MA", lat: 42.3601, lon: -71.0589, population: 695_000 },
    City { name: "Austin", county: "Travis", state_code: "TX", lat: 30.2672, lon: -97.7431, population: 978_000 },
    City { name: "Atlanta", county: "Fulton", state_code: "GA", lat: 33.7490, lon: -84.3880, population: 524_000 },
    City { name: "Miami", county: "Miami-Dade", state_code: "FL", lat: 25.7617, lon: -80.1918, population: 463_000 },
    City { name: "Denver", county: "Denver", state_code: "CO", lat: 39.7392, lon: -104.9903, population: 716_000 },
];

/// Find a city by name, optionally followed by ", ST" or ", State"
#[must_use]
pub fn lookup_city(text: &str) -> Option<&'static City> {
    let text = text.trim();
    let (name, state) = match text.rsplit_once(',') {
        Some((head, tail)) => (head.trim(), Some(lookup_state(tail.trim())?)),
        None => (text, None),
    };
    let name = name
        .strip_suffix(" City")
        .or_else(|| name.strip_suffix(" city"))
        .unwrap_or(name);
    CITIES.iter().find(|city| {
        city.name.eq_ignore_ascii_case(name) && state.is_none_or(|s| s.code == city.state_code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Chicago", "Cook County, IL")]
    #[case("chicago, illinois", "Cook County, IL")]
    #[case("Houston, TX", "Harris County, TX")]
    #[case("New York City", "New York County, NY")]
    #[case("Miami", "Miami-Dade County, FL")]
    fn test_lookup_city(#[case] text: &str, #[case] county: &str) {
        assert_eq!(lookup_city(text).map(City::county_region).as_deref(), Some(county));
    }

    #[rstest]
    #[case("Chicago, TX")]
    #[case("Springfield")]
    #[case("Chicago, Narnia")]
    fn test_unknown_city(#[case] text: &str) {
        assert!(lookup_city(text).is_none());
    }
}
