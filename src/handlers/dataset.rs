//! `show_local_dataset`: power lines or oil wells as a plain overlay

use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::{
    Action, ActionType, AssetDataset, AssetFeature, Layer, LayerFeature, LayerMetadata, LayerRole,
    LayerStyle,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

pub struct ShowLocalDatasetHandler;

pub(crate) fn default_style() -> LayerStyle {
    LayerStyle::area("#0066cc", "#ffff00", 4.0, 0.5)
}

pub(crate) fn asset_feature(asset: &AssetFeature) -> LayerFeature {
    let mut feature = LayerFeature::new(asset.geometry.clone()).with_property("id", json!(asset.id));
    for (key, value) in &asset.attributes {
        feature = feature.with_property(key.as_str(), value.clone());
    }
    feature
}

#[async_trait]
impl ActionHandler for ShowLocalDatasetHandler {
    fn action_type(&self) -> ActionType {
        ActionType::ShowLocalDataset
    }

    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::ShowLocalDataset(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        let region = match &params.region {
            Some(text) => Some(ctx.resolve_region(text, None).await?),
            None => None,
        };
        let assets = ctx
            .datasets
            .fetch_asset_features(params.dataset, region.as_deref())
            .await
            .map_err(|e| {
                let scope = match &region {
                    Some(region) => format!("{} in {}", params.dataset, region.label()),
                    None => params.dataset.to_string(),
                };
                e.with_fetch_context("fetch_asset_features", &scope, None)
            })?;
        info!("show_local_dataset: {} {} features", assets.len(), params.dataset);

        let mut metadata = LayerMetadata::new(params.dataset.as_str())
            .with_property("feature_count", json!(assets.len()));
        if let Some(region) = &region {
            metadata = metadata.with_region(region.label());
        }
        if assets.is_empty() {
            metadata.notice = Some(match &region {
                Some(region) => format!("No {} found in {}", params.dataset, region.label()),
                None => format!("No {} data available", params.dataset),
            });
        }

        let label = match params.dataset {
            AssetDataset::PowerLines => "Power Lines",
            AssetDataset::OilWells => "Oil Wells",
        };
        Ok(vec![
            Layer::new(label, LayerRole::Overlay, metadata)
                .with_style(params.style.apply(default_style()))
                .with_features(assets.iter().map(asset_feature).collect()),
        ])
    }
}
