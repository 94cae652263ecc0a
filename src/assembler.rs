//! Layer assembly: deterministic draw order and overall extent

use crate::models::{Layer, LayerRole};
use geo::{BoundingRect, Coord, Rect};
use tracing::debug;

/// Order layers by role, keeping handler order within a role
///
/// Base outlines come first and risk highlighting last, so a renderer that
/// draws in sequence puts risk on top. Empty layers are kept: a layer with
/// `no_data` set still carries the diagnostic the caller needs.
#[must_use]
pub fn assemble(mut layers: Vec<Layer>) -> Vec<Layer> {
    layers.sort_by_key(|layer| layer.role);
    debug!(
        "Assembled {} layers ({} base, {} risk)",
        layers.len(),
        count(&layers, LayerRole::Base),
        count(&layers, LayerRole::Risk)
    );
    layers
}

fn count(layers: &[Layer], role: LayerRole) -> usize {
    layers.iter().filter(|l| l.role == role).count()
}

/// Bounding rectangle of every feature in `layers`
#[must_use]
pub fn bounds_of(layers: &[Layer]) -> Option<Rect<f64>> {
    layers
        .iter()
        .flat_map(|layer| &layer.features)
        .filter_map(|feature| feature.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
}
