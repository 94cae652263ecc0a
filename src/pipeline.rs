//! `process_action`: normalize, dispatch and assemble one raw action
//!
//! [`GeoAssist`] owns the long-lived collaborators (dataset facade, region
//! cache, risk engine, handler registry). Each call is independent apart from
//! the region cache.

use crate::Result;
use crate::assembler::assemble;
use crate::cache::RegionCache;
use crate::config::GeoAssistConfig;
use crate::dataset::{DatasetAccess, StaticDatasets};
use crate::dispatcher::{HandlerContext, HandlerRegistry};
use crate::models::Layer;
use crate::normalizer::Normalizer;
use crate::region_resolver::RegionResolver;
use crate::risk::{CustomerEstimator, RiskEngine};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-session state supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// First forecast day; wind horizons start here and earlier dates clamp to it
    pub reference_date: NaiveDate,
}

impl SessionContext {
    #[must_use]
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Session starting today (UTC)
    #[must_use]
    pub fn today() -> Self {
        Self::new(Utc::now().date_naive())
    }
}

/// The action pipeline with its collaborators
pub struct GeoAssist {
    normalizer: Normalizer,
    registry: HandlerRegistry,
    datasets: Arc<dyn DatasetAccess>,
    resolver: RegionResolver,
    engine: Arc<RiskEngine>,
}

impl GeoAssist {
    /// Pipeline over `datasets` with the built-in handlers
    pub fn new(datasets: Arc<dyn DatasetAccess>, config: &GeoAssistConfig) -> Self {
        let cache = Arc::new(RegionCache::with_ttl_seconds(
            config.cache.region_ttl_seconds,
        ));
        Self {
            normalizer: Normalizer::new(config.risk.oil_well_region.clone()),
            registry: HandlerRegistry::with_defaults(),
            resolver: RegionResolver::new(Arc::clone(&datasets), cache),
            engine: Arc::new(RiskEngine::new(config.risk.clone())),
            datasets,
        }
    }

    /// Pipeline over the GeoJSON files named in `config`
    pub async fn from_config(config: &GeoAssistConfig) -> anyhow::Result<Self> {
        let datasets = StaticDatasets::load(&config.datasets)
            .await
            .context("Failed to load datasets")?;
        Ok(Self::new(Arc::new(datasets), config))
    }

    #[must_use]
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn CustomerEstimator>) -> Self {
        let engine = RiskEngine::clone(&self.engine).with_estimator(estimator);
        self.engine = Arc::new(engine);
        self
    }

    #[must_use]
    pub fn region_cache(&self) -> &RegionCache {
        self.resolver.cache()
    }

    fn handler_context(&self, session: &SessionContext) -> HandlerContext {
        HandlerContext {
            datasets: Arc::clone(&self.datasets),
            resolver: self.resolver.clone(),
            engine: Arc::clone(&self.engine),
            reference_date: session.reference_date,
        }
    }

    /// Turn one raw action into an ordered layer list
    ///
    /// Any failure returns the error and no layers.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn process_action(
        &self,
        raw_action: &Value,
        session: &SessionContext,
    ) -> Result<Vec<Layer>> {
        let action = self.normalizer.normalize(raw_action).inspect_err(|e| {
            warn!("Rejected action: {}", e);
        })?;
        let action_type = action.action_type();
        let layers = self
            .registry
            .dispatch(&action, &self.handler_context(session))
            .await
            .inspect_err(|e| warn!("{} failed: {}", action_type, e))?;
        let layers = assemble(layers);
        info!("{} produced {} layers", action_type, layers.len());
        Ok(layers)
    }

    /// Process each action independently, in order
    pub async fn process_actions(
        &self,
        raw_actions: &[Value],
        session: &SessionContext,
    ) -> Vec<Result<Vec<Layer>>> {
        let mut outcomes = Vec::with_capacity(raw_actions.len());
        for raw_action in raw_actions {
            outcomes.push(self.process_action(raw_action, session).await);
        }
        outcomes
    }
}
