//! Pluggable affected-customer estimation
//!
//! No demographic source ships with the crate. An estimator is injected into
//! [`super::RiskEngine`]; without one, wind results carry no customer figure.

use crate::models::Region;
use geo::MultiPolygon;
use std::collections::BTreeSet;

/// Estimates how many customers are served inside a risk footprint
pub trait CustomerEstimator: Send + Sync {
    /// `footprint` is the union of risk cells at one timestamp and tier;
    /// `line_ids` are the power lines at risk there (empty for area-only runs).
    /// Returning `None` means no estimate is available.
    fn estimate(
        &self,
        region: &Region,
        footprint: &MultiPolygon<f64>,
        line_ids: &BTreeSet<String>,
    ) -> Option<u64>;
}

/// Fixed number of customers per at-risk line
#[derive(Debug, Clone, Copy)]
pub struct PerLineEstimator {
    pub customers_per_line: u64,
}

impl CustomerEstimator for PerLineEstimator {
    fn estimate(
        &self,
        _region: &Region,
        _footprint: &MultiPolygon<f64>,
        line_ids: &BTreeSet<String>,
    ) -> Option<u64> {
        if line_ids.is_empty() {
            return None;
        }
        u64::try_from(line_ids.len())
            .ok()
            .map(|n| n.saturating_mul(self.customers_per_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionKind;

    #[test]
    fn test_per_line_estimate() {
        let region = Region {
            kind: RegionKind::State,
            name: "Illinois".to_string(),
            state_code: "IL".to_string(),
            fips: "17".to_string(),
            boundary: MultiPolygon(vec![]),
        };
        let estimator = PerLineEstimator {
            customers_per_line: 250,
        };
        let lines: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();
        assert_eq!(
            estimator.estimate(&region, &MultiPolygon(vec![]), &lines),
            Some(500)
        );
        assert_eq!(
            estimator.estimate(&region, &MultiPolygon(vec![]), &BTreeSet::new()),
            None
        );
    }
}
