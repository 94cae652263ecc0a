//! Action dispatch through a handler registry
//!
//! Each action type has exactly one registered [`ActionHandler`]. Adding an
//! action type means registering one more handler; the dispatcher itself
//! never branches on the type.

use crate::Result;
use crate::cities::lookup_city;
use crate::dataset::DatasetAccess;
use crate::error::{GeoAssistError, RegionLookupFailure};
use crate::handlers;
use crate::models::{Action, ActionType, Layer, Region, RegionKind};
use crate::region_resolver::RegionResolver;
use crate::risk::RiskEngine;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Produces layers for one action type
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn action_type(&self) -> ActionType;

    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>>;
}

/// Collaborators and session state available to handlers
#[derive(Clone)]
pub struct HandlerContext {
    pub datasets: Arc<dyn DatasetAccess>,
    pub resolver: RegionResolver,
    pub engine: Arc<RiskEngine>,
    /// First forecast day of the session
    pub reference_date: NaiveDate,
}

impl HandlerContext {
    /// Resolve region text, falling back to the city table for names that are
    /// neither a state nor a county
    pub async fn resolve_region(
        &self,
        region_text: &str,
        kind: Option<RegionKind>,
    ) -> Result<Arc<Region>> {
        match self.resolver.resolve_as(region_text, kind).await {
            Err(GeoAssistError::RegionNotFound {
                kind: RegionLookupFailure::NotFound,
                ..
            }) if kind != Some(RegionKind::State) => {
                let Some(city) = lookup_city(region_text) else {
                    return Err(GeoAssistError::region_not_found(region_text));
                };
                debug!("Resolving city {} via {}", city.name, city.county_region());
                self.resolver
                    .resolve_as(&city.county_region(), Some(RegionKind::County))
                    .await
                    .map_err(|_| GeoAssistError::region_not_found(region_text))
            }
            other => other,
        }
    }
}

/// Error for a handler invoked with an action of another type
pub(crate) fn mismatched(expected: ActionType, action: &Action) -> GeoAssistError {
    error!(
        "Handler for {} received a {} action",
        expected,
        action.action_type()
    );
    GeoAssistError::dispatch(action.action_type().as_str())
}

/// Map from action type to its handler
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handler for every action type
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for handler in handlers::default_handlers() {
            registry.register(handler);
        }
        registry
    }

    /// Register a handler, returning the one it replaced
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.insert(handler.action_type(), handler)
    }

    #[must_use]
    pub fn contains(&self, action_type: ActionType) -> bool {
        self.handlers.contains_key(&action_type)
    }

    /// Registered types in declaration order
    #[must_use]
    pub fn registered_types(&self) -> Vec<ActionType> {
        let mut types: Vec<ActionType> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    /// Run the handler registered for the action's type
    pub async fn dispatch(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let action_type = action.action_type();
        let Some(handler) = self.handlers.get(&action_type) else {
            error!("No handler registered for action type {}", action_type);
            return Err(GeoAssistError::dispatch(action_type.as_str()));
        };
        debug!("Dispatching {}", action_type);
        handler.handle(action, ctx).await
    }
}
