//! Infrastructure asset features (power lines, oil wells)

use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Local infrastructure datasets the facade can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetDataset {
    /// LineString segments, nationwide
    PowerLines,
    /// Points, North Dakota only
    OilWells,
}

impl AssetDataset {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetDataset::PowerLines => "power_lines",
            AssetDataset::OilWells => "oil_wells",
        }
    }

    /// Parse a `dataset_name`, accepting legacy aliases
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "power_lines" | "pa_power_lines" | "powerlines" => Some(AssetDataset::PowerLines),
            "oil_wells" | "nd_oil_wells" | "wells" => Some(AssetDataset::OilWells),
            _ => None,
        }
    }

    /// Power lines are too large to scan without a region
    #[must_use]
    pub fn requires_region(&self) -> bool {
        matches!(self, AssetDataset::PowerLines)
    }
}

impl fmt::Display for AssetDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable asset record
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFeature {
    pub id: String,
    pub geometry: Geometry<f64>,
    pub attributes: BTreeMap<String, Value>,
}

impl AssetFeature {
    pub fn new<S: Into<String>>(id: S, geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("power_lines", Some(AssetDataset::PowerLines))]
    #[case("pa_power_lines", Some(AssetDataset::PowerLines))]
    #[case("Oil_Wells", Some(AssetDataset::OilWells))]
    #[case("pipelines", None)]
    fn test_parse_dataset(#[case] text: &str, #[case] expected: Option<AssetDataset>) {
        assert_eq!(AssetDataset::parse(text), expected);
    }

    #[test]
    fn test_requires_region() {
        assert!(AssetDataset::PowerLines.requires_region());
        assert!(!AssetDataset::OilWells.requires_region());
    }
}
