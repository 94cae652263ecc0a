//! Free-text region resolution to state and county boundaries
//!
//! Understands "Illinois", "IL", "Crawford County", "Crawford, PA" and
//! "Crawford County, Pennsylvania". Cities are not resolved here; see
//! [`crate::cities`].

use crate::Result;
use crate::cache::RegionCache;
use crate::dataset::DatasetAccess;
use crate::error::GeoAssistError;
use crate::models::region::{UsState, lookup_state, normalize_name, region_key};
use crate::models::{Region, RegionKind};
use std::sync::Arc;
use tracing::debug;

/// Parsed form of a region string
#[derive(Debug, Clone, PartialEq, Eq)]
struct RegionQuery {
    name: String,
    state: Option<&'static UsState>,
    /// Text carried an explicit "County"/"Parish" suffix
    county_suffix: bool,
}

impl RegionQuery {
    fn parse(text: &str) -> Self {
        let text = text.trim();
        let (name, state) = match text.rsplit_once(',') {
            Some((head, tail)) => match lookup_state(tail.trim()) {
                Some(state) => (head.trim(), Some(state)),
                None => (text, None),
            },
            None => (text, None),
        };
        let lowered = name.to_lowercase();
        Self {
            county_suffix: lowered.ends_with(" county") || lowered.ends_with(" parish"),
            name: name.to_string(),
            state,
        }
    }
}

/// Resolves region text against the dataset facade, with an injected cache
#[derive(Clone)]
pub struct RegionResolver {
    datasets: Arc<dyn DatasetAccess>,
    cache: Arc<RegionCache>,
}

impl RegionResolver {
    pub fn new(datasets: Arc<dyn DatasetAccess>, cache: Arc<RegionCache>) -> Self {
        Self { datasets, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &RegionCache {
        &self.cache
    }

    /// Resolve a state or county
    pub async fn resolve(&self, region_text: &str) -> Result<Arc<Region>> {
        self.resolve_as(region_text, None).await
    }

    /// Resolve, optionally restricted to one region kind
    #[tracing::instrument(name = "resolve_region", level = "debug", skip(self))]
    pub async fn resolve_as(
        &self,
        region_text: &str,
        kind: Option<RegionKind>,
    ) -> Result<Arc<Region>> {
        let query = RegionQuery::parse(region_text);
        if query.name.is_empty() {
            return Err(GeoAssistError::region_not_found(region_text));
        }

        let try_state = kind != Some(RegionKind::County) && !query.county_suffix;
        if try_state {
            // "Texas" or "Texas, TX"; a different state suffix means a county
            if let Some(state) = lookup_state(&query.name)
                .filter(|s| query.state.is_none_or(|suffix| suffix.code == s.code))
            {
                return self.resolve_state(state, region_text).await;
            }
            if kind == Some(RegionKind::State) {
                return Err(GeoAssistError::region_not_found(region_text));
            }
        }

        self.resolve_county(&query, region_text).await
    }

    async fn resolve_state(&self, state: &UsState, region_text: &str) -> Result<Arc<Region>> {
        let key = region_key(RegionKind::State, state.name, state.code);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let mut found = self
            .datasets
            .lookup_region_boundary(RegionKind::State, state.name, Some(state.code))
            .await?;
        if found.is_empty() {
            debug!("No boundary record for state {}", state.name);
            return Err(GeoAssistError::region_not_found(region_text));
        }
        let region = Arc::new(found.swap_remove(0));
        self.cache.put(&key, Arc::clone(&region));
        Ok(region)
    }

    async fn resolve_county(&self, query: &RegionQuery, region_text: &str) -> Result<Arc<Region>> {
        let state_code = query.state.map_or("", |s| s.code);
        let key = region_key(RegionKind::County, &query.name, state_code);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let mut found = self
            .datasets
            .lookup_region_boundary(
                RegionKind::County,
                &normalize_name(&query.name),
                query.state.map(|s| s.code),
            )
            .await?;
        found.sort_by(|a, b| a.fips.cmp(&b.fips));

        let distinct_states = {
            let mut codes: Vec<&str> = found.iter().map(|r| r.state_code.as_str()).collect();
            codes.dedup();
            codes.len()
        };

        match (found.len(), distinct_states) {
            (0, _) => Err(GeoAssistError::region_not_found(region_text)),
            (_, n) if n >= 2 => {
                let mut candidates: Vec<String> = found.iter().map(Region::label).collect();
                candidates.sort();
                candidates.dedup();
                debug!("Ambiguous county {:?}: {:?}", query.name, candidates);
                Err(GeoAssistError::region_ambiguous(region_text, candidates))
            }
            _ => {
                let region = Arc::new(found.swap_remove(0));
                self.cache.put(&key, Arc::clone(&region));
                Ok(region)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StaticDatasets;
    use crate::error::RegionLookupFailure;
    use geo::{MultiPolygon, Rect};
    use rstest::rstest;

    fn region(kind: RegionKind, name: &str, code: &str, fips: &str) -> Region {
        Region {
            kind,
            name: name.to_string(),
            state_code: code.to_string(),
            fips: fips.to_string(),
            boundary: MultiPolygon(vec![Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon()]),
        }
    }

    fn resolver() -> RegionResolver {
        let datasets = StaticDatasets::new().with_regions(vec![
            region(RegionKind::State, "Pennsylvania", "PA", "42"),
            region(RegionKind::State, "Washington", "WA", "53"),
            region(RegionKind::County, "Crawford", "PA", "42039"),
            region(RegionKind::County, "Crawford", "OH", "39033"),
            region(RegionKind::County, "Crawford", "IL", "17033"),
            region(RegionKind::County, "Washington", "PA", "42125"),
            region(RegionKind::County, "Allegheny", "PA", "42003"),
        ]);
        RegionResolver::new(Arc::new(datasets), Arc::new(RegionCache::default()))
    }

    #[tokio::test]
    async fn test_ambiguous_county_without_state() {
        let err = resolver().resolve("Crawford County").await.unwrap_err();
        match err {
            GeoAssistError::RegionNotFound {
                kind: RegionLookupFailure::Ambiguous,
                candidates,
                ..
            } => assert_eq!(
                candidates,
                vec![
                    "Crawford County, IL".to_string(),
                    "Crawford County, OH".to_string(),
                    "Crawford County, PA".to_string(),
                ]
            ),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[rstest]
    #[case("Crawford County, PA")]
    #[case("crawford county, pa")]
    #[case("Crawford, Pennsylvania")]
    #[case("  Crawford County ,  PA ")]
    #[tokio::test]
    async fn test_county_with_state_resolves_uniquely(#[case] text: &str) {
        let region = resolver().resolve(text).await.unwrap();
        assert_eq!(region.fips, "42039");
        assert_eq!(region.label(), "Crawford County, PA");
    }

    #[tokio::test]
    async fn test_unique_county_without_state() {
        let region = resolver().resolve("Allegheny County").await.unwrap();
        assert_eq!(region.state_code, "PA");
    }

    #[rstest]
    #[case("Pennsylvania")]
    #[case("PA")]
    #[case("pennsylvania")]
    #[tokio::test]
    async fn test_state_resolution(#[case] text: &str) {
        let region = resolver().resolve(text).await.unwrap();
        assert_eq!(region.kind, RegionKind::State);
        assert_eq!(region.fips, "42");
    }

    #[tokio::test]
    async fn test_state_name_prefers_state_unless_county_requested() {
        let resolver = resolver();
        let state = resolver.resolve("Washington").await.unwrap();
        assert_eq!(state.kind, RegionKind::State);

        let county = resolver.resolve("Washington County, PA").await.unwrap();
        assert_eq!(county.fips, "42125");

        let county = resolver
            .resolve_as("Washington", Some(RegionKind::County))
            .await
            .unwrap();
        assert_eq!(county.fips, "42125");
    }

    #[rstest]
    #[case("Atlantis")]
    #[case("Chicago")]
    #[case("")]
    #[case("Crawford County, TX")]
    #[tokio::test]
    async fn test_not_found(#[case] text: &str) {
        let err = resolver().resolve(text).await.unwrap_err();
        assert!(matches!(
            err,
            GeoAssistError::RegionNotFound {
                kind: RegionLookupFailure::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let resolver = resolver();
        assert!(resolver.cache().is_empty());
        let first = resolver.resolve("Crawford County, PA").await.unwrap();
        assert_eq!(resolver.cache().len(), 1);
        let second = resolver.resolve("Crawford County, PA").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Ambiguity is never cached
        let _ = resolver.resolve("Crawford County").await;
        assert_eq!(resolver.cache().len(), 1);
    }
}
