//! Buffered corridors around power line segments
//!
//! A corridor is the union of capsules, one per segment, each the convex hull
//! of two ellipses approximating a metric circle at the segment's latitude.

use crate::models::AssetFeature;
use geo::{BoundingRect, ConvexHull, Coord, Geometry, Intersects, Line, MultiPoint, Point, Polygon, Rect};
use rstar::{AABB, RTree, RTreeObject};
use std::f64::consts::TAU;

const METERS_PER_DEGREE: f64 = 111_320.0;
const CIRCLE_STEPS: usize = 16;

/// Capsules around one line asset
#[derive(Debug, Clone, PartialEq)]
pub struct Corridor {
    pub asset_id: String,
    pub capsules: Vec<Polygon<f64>>,
}

impl Corridor {
    /// Build the corridor for a line feature; non-line geometries yield `None`
    #[must_use]
    pub fn around(feature: &AssetFeature, buffer_m: f64) -> Option<Self> {
        let capsules: Vec<Polygon<f64>> = segments(&feature.geometry)
            .into_iter()
            .map(|segment| capsule(segment, buffer_m))
            .collect();
        (!capsules.is_empty()).then(|| Self {
            asset_id: feature.id.clone(),
            capsules,
        })
    }

    #[must_use]
    pub fn intersects_polygon(&self, polygon: &Polygon<f64>) -> bool {
        self.capsules.iter().any(|capsule| capsule.intersects(polygon))
    }
}

fn segments(geometry: &Geometry<f64>) -> Vec<Line<f64>> {
    match geometry {
        Geometry::Line(line) => vec![*line],
        Geometry::LineString(ls) => ls.lines().collect(),
        Geometry::MultiLineString(mls) => mls.iter().flat_map(|ls| ls.lines()).collect(),
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(segments).collect(),
        _ => Vec::new(),
    }
}

/// Buffer one segment by `buffer_m` metres in a local equirectangular frame
#[must_use]
pub fn capsule(segment: Line<f64>, buffer_m: f64) -> Polygon<f64> {
    let mid_lat = (segment.start.y + segment.end.y) / 2.0;
    let ry = buffer_m / METERS_PER_DEGREE;
    let rx = buffer_m / (METERS_PER_DEGREE * mid_lat.to_radians().cos().max(0.01));

    let ring = |center: Coord<f64>| {
        (0..CIRCLE_STEPS).map(move |step| {
            #[allow(clippy::cast_precision_loss)]
            let angle = TAU * step as f64 / CIRCLE_STEPS as f64;
            Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
    };
    let points: MultiPoint<f64> = ring(segment.start).chain(ring(segment.end)).collect();
    points.convex_hull()
}

#[derive(Debug, Clone)]
struct CorridorBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for CorridorBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Corridors with a bounding-box index for cell queries
#[derive(Debug)]
pub struct CorridorIndex {
    corridors: Vec<Corridor>,
    rtree: RTree<CorridorBox>,
}

impl CorridorIndex {
    #[must_use]
    pub fn new(lines: &[AssetFeature], buffer_m: f64) -> Self {
        let corridors: Vec<Corridor> = lines
            .iter()
            .filter_map(|line| Corridor::around(line, buffer_m))
            .collect();
        let boxes = corridors
            .iter()
            .enumerate()
            .flat_map(|(idx, corridor)| {
                corridor
                    .capsules
                    .iter()
                    .filter_map(move |c| c.bounding_rect().map(|bbox| CorridorBox { idx, bbox }))
            })
            .collect();
        Self {
            corridors,
            rtree: RTree::bulk_load(boxes),
        }
    }

    #[must_use]
    pub fn corridors(&self) -> &[Corridor] {
        &self.corridors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corridors.is_empty()
    }

    /// Corridors intersecting `polygon`, in insertion order
    #[must_use]
    pub fn intersecting(&self, polygon: &Polygon<f64>) -> Vec<&Corridor> {
        let Some(bbox) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());
        let mut hits: Vec<usize> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|b| b.idx)
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter()
            .map(|idx| &self.corridors[idx])
            .filter(|corridor| corridor.intersects_polygon(polygon))
            .collect()
    }
}
