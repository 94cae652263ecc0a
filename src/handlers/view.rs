//! `fit_bounds`: explicit viewport hint

use crate::Result;
use crate::dispatcher::{ActionHandler, HandlerContext, mismatched};
use crate::models::{Action, ActionType, Layer, LayerFeature, LayerMetadata, LayerRole};
use async_trait::async_trait;
use geo::Rect;

pub struct FitBoundsHandler;

#[async_trait]
impl ActionHandler for FitBoundsHandler {
    fn action_type(&self) -> ActionType {
        ActionType::FitBounds
    }

    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<Vec<Layer>> {
        let Action::FitBounds(params) = action else {
            return Err(mismatched(self.action_type(), action));
        };
        // Rect::new normalizes swapped corners
        let bounds = Rect::new(params.south_west.to_coord(), params.north_east.to_coord());
        Ok(vec![
            Layer::new(
                "Bounds",
                LayerRole::Viewport,
                LayerMetadata::new(self.action_type().as_str()),
            )
            .with_features(vec![LayerFeature::new(bounds.to_polygon())]),
        ])
    }
}
