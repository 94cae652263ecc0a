//! Region model: US states and counties with their boundaries

use geo::{BoundingRect, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of administrative region the resolver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    State,
    County,
}

impl RegionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::State => "state",
            RegionKind::County => "county",
        }
    }

    /// Parse a `region_type` string; anything else is unsupported
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "state" => Some(RegionKind::State),
            "county" | "parish" | "borough" => Some(RegionKind::County),
            _ => None,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical boundary record for a state or county
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub kind: RegionKind,
    /// Base name without any "County" suffix, e.g. "Crawford" or "Pennsylvania"
    pub name: String,
    /// Two-letter postal code of the state (the state itself for states)
    pub state_code: String,
    /// FIPS code: 2 digits for states, 5 for counties
    pub fips: String,
    pub boundary: MultiPolygon<f64>,
}

impl Region {
    /// Human-readable label, e.g. "Crawford County, PA" or "Pennsylvania"
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            RegionKind::State => self.name.clone(),
            RegionKind::County => format!("{} County, {}", self.name, self.state_code),
        }
    }

    /// Full state name for this region's state
    #[must_use]
    pub fn state_name(&self) -> &str {
        state_by_code(&self.state_code).map_or(self.state_code.as_str(), |s| s.name)
    }

    /// Cache key: normalized name plus state
    #[must_use]
    pub fn key(&self) -> String {
        region_key(self.kind, &self.name, &self.state_code)
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.boundary.bounding_rect()
    }
}

/// Cache key shared by the resolver and its cache
#[must_use]
pub fn region_key(kind: RegionKind, name: &str, state_code: &str) -> String {
    format!(
        "{}:{}:{}",
        kind.as_str(),
        normalize_name(name),
        state_code.to_ascii_uppercase()
    )
}

/// Lowercase, collapse whitespace and drop a trailing "County"/"Parish"/"Borough"
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let collapsed = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    for suffix in [" county", " parish", " borough"] {
        if let Some(stripped) = collapsed.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    collapsed
}

/// Entry of the static US state table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    pub name: &'static str,
    pub code: &'static str,
    pub fips: &'static str,
}

const US_STATES: &[UsState] = &[
    UsState { name: "Alabama", code: "AL", fips: "01" },
    UsState { name: "Alaska", code: "AK", fips: "02" },
    UsState { name: "Arizona", code: "AZ", fips: "04" },
    UsState { name: "Arkansas", code: "AR", fips: "05" },
    UsState { name: "California", code: "CA", fips: "06" },
    UsState { name: "Colorado", code: "CO", fips: "08" },
    UsState { name: "Connecticut", code: "CT", fips: "09" },
    UsState { name: "Delaware", code: "DE", fips: "10" },
    UsState { name: "District of Columbia", code: "DC", fips: "11" },
    UsState { name: "Florida", code: "FL", fips: "12" },
    UsState { name: "Georgia", code: "GA", fips: "13" },
    UsState { name: "Hawaii", code: "HI", fips: "15" },
    UsState { name: "Idaho", code: "ID", fips: "16" },
    UsState { name: "Illinois", code: "IL", fips: "17" },
    UsState { name: "Indiana", code: "IN", fips: "18" },
    UsState { name: "Iowa", code: "IA", fips: "19" },
    UsState { name: "Kansas", code: "KS", fips: "20" },
    UsState { name: "Kentucky", code: "KY", fips: "21" },
    UsState { name: "Louisiana", code: "LA", fips: "22" },
    UsState { name: "Maine", code: "ME", fips: "23" },
    UsState { name: "Maryland", code: "MD", fips: "24" },
    UsState { name: "Massachusetts", code: "MA", fips: "25" },
    UsState { name: "Michigan", code: "MI", fips: "26" },
    UsState { name: "Minnesota", code: "MN", fips: "27" },
    UsState { name: "Mississippi", code: "MS", fips: "28" },
    UsState { name: "Missouri", code: "MO", fips: "29" },
    UsState { name: "Montana", code: "MT", fips: "30" },
    UsState { name: "Nebraska", code: "NE", fips: "31" },
    UsState { name: "Nevada", code: "NV", fips: "32" },
    UsState { name: "New Hampshire", code: "NH", fips: "33" },
    UsState { name: "New Jersey", code: "NJ", fips: "34" },
    UsState { name: "New Mexico", code: "NM", fips: "35" },
    UsState { name: "New York", code: "NY", fips: "36" },
    UsState { name: "North Carolina", code: "NC", fips: "37" },
    UsState { name: "North Dakota", code: "ND", fips: "38" },
    UsState { name: "Ohio", code: "OH", fips: "39" },
    UsState { name: "Oklahoma", code: "OK", fips: "40" },
    UsState { name: "Oregon", code: "OR", fips: "41" },
    UsState { name: "Pennsylvania", code: "PA", fips: "42" },
    UsState { name: "Rhode Island", code: "RI", fips: "44" },
    UsState { name: "South Carolina", code: "SC", fips: "45" },
    UsState { name: "South Dakota", code: "SD", fips: "46" },
    UsState { name: "Tennessee", code: "TN", fips: "47" },
    UsState { name: "Texas", code: "TX", fips: "48" },
    UsState { name: "Utah", code: "UT", fips: "49" },
    UsState { name: "Vermont", code: "VT", fips: "50" },
    UsState { name: "Virginia", code: "VA", fips: "51" },
    UsState { name: "Washington", code: "WA", fips: "53" },
    UsState { name: "West Virginia", code: "WV", fips: "54" },
    UsState { name: "Wisconsin", code: "WI", fips: "55" },
    UsState { name: "Wyoming", code: "WY", fips: "56" },
    UsState { name: "Puerto Rico", code: "PR", fips: "72" },
];

/// Look up a state by full name or postal code, case-insensitively
#[must_use]
pub fn lookup_state(text: &str) -> Option<&'static UsState> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = text
        .strip_prefix("State of ")
        .or_else(|| text.strip_prefix("state of "))
        .unwrap_or(&text);
    US_STATES.iter().find(|s| {
        s.name.eq_ignore_ascii_case(text) || (text.len() == 2 && s.code.eq_ignore_ascii_case(text))
    })
}

#[must_use]
pub fn state_by_code(code: &str) -> Option<&'static UsState> {
    US_STATES.iter().find(|s| s.code.eq_ignore_ascii_case(code))
}

#[must_use]
pub fn state_by_fips(fips: &str) -> Option<&'static UsState> {
    US_STATES.iter().find(|s| s.fips == fips)
}
