//! `highlight_region`: one state or county outline

use super::region_layer;
use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::{Action, ActionType, Layer, LayerRole, LayerStyle};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

pub struct HighlightRegionHandler;

pub(crate) fn default_style() -> LayerStyle {
    LayerStyle::area("black", "#ff7800", 2.0, 0.5)
}

#[async_trait]
impl ActionHandler for HighlightRegionHandler {
    fn action_type(&self) -> ActionType {
        ActionType::HighlightRegion
    }

    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::HighlightRegion(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let region = ctx.resolve_region(&params.region, params.region_type).await?;
        info!("highlight_region: {}", region.label());

        let mut layer = region_layer(
            &region.label(),
            &region,
            "region_boundaries",
            LayerRole::Base,
            params.style.apply(default_style()),
        );
        layer.metadata = layer
            .metadata
            .with_property("kind", json!(region.kind.as_str()))
            .with_property("state", json!(region.state_name()))
            .with_property("fips", json!(region.fips));
        Ok(vec![layer])
    }
}
