//! GeoJSON reading and writing for `geo` geometries

use crate::Result;
use crate::error::GeoAssistError;
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::{Map, Value, json};

/// One feature of a FeatureCollection
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonFeature {
    pub id: Option<Value>,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

impl GeoJsonFeature {
    /// Look up a property, trying each key in turn
    #[must_use]
    pub fn property(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .find_map(|key| self.properties.get(*key))
            .filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn string_property(&self, keys: &[&str]) -> Option<String> {
        self.property(keys).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Write a geometry as a GeoJSON geometry object.
#[must_use]
pub fn geometry_to_value(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({"type": "Point", "coordinates": coord(p.0)}),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| coord(p.0)).collect::<Vec<_>>(),
        }),
        Geometry::Line(line) => json!({
            "type": "LineString",
            "coordinates": [coord(line.start), coord(line.end)],
        }),
        Geometry::LineString(ls) => json!({"type": "LineString", "coordinates": ring(ls)}),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(ring).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(poly) => json!({"type": "Polygon", "coordinates": polygon_rings(poly)}),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_rings).collect::<Vec<_>>(),
        }),
        Geometry::Rect(rect) => json!({
            "type": "Polygon",
            "coordinates": polygon_rings(&rect.to_polygon()),
        }),
        Geometry::Triangle(tri) => json!({
            "type": "Polygon",
            "coordinates": polygon_rings(&tri.to_polygon()),
        }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.0.iter().map(geometry_to_value).collect::<Vec<_>>(),
        }),
    }
}

fn coord(c: Coord<f64>) -> Value {
    json!([c.x, c.y])
}

fn ring(ls: &LineString<f64>) -> Vec<Value> {
    ls.coords().map(|c| coord(*c)).collect()
}

fn polygon_rings(poly: &Polygon<f64>) -> Vec<Vec<Value>> {
    std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .map(ring)
        .collect()
}

/// Parse a GeoJSON geometry object.
pub fn parse_geometry(value: &Value, context: &str) -> Result<Geometry<f64>> {
    let kind = value["type"]
        .as_str()
        .ok_or_else(|| invalid(context, "geometry without a type"))?;

    if kind == "GeometryCollection" {
        let members = value["geometries"]
            .as_array()
            .ok_or_else(|| invalid(context, "GeometryCollection without geometries"))?;
        let geometries = members
            .iter()
            .map(|member| parse_geometry(member, context))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Geometry::GeometryCollection(GeometryCollection(geometries)));
    }

    let coords = &value["coordinates"];
    let geometry = match kind {
        "Point" => Geometry::Point(Point(parse_coord(coords, context)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint(
            array(coords, context)?
                .iter()
                .map(|c| parse_coord(c, context).map(Point))
                .collect::<Result<_>>()?,
        )),
        "LineString" => Geometry::LineString(parse_line(coords, context)?),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString(
            array(coords, context)?
                .iter()
                .map(|c| parse_line(c, context))
                .collect::<Result<_>>()?,
        )),
        "Polygon" => Geometry::Polygon(parse_polygon(coords, context)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon(
            array(coords, context)?
                .iter()
                .map(|c| parse_polygon(c, context))
                .collect::<Result<_>>()?,
        )),
        other => return Err(invalid(context, &format!("unsupported geometry type {other}"))),
    };
    Ok(geometry)
}

/// Parse a FeatureCollection (or a single Feature) into its features.
pub fn parse_feature_collection(value: &Value, context: &str) -> Result<Vec<GeoJsonFeature>> {
    match value["type"].as_str() {
        Some("FeatureCollection") => array(&value["features"], context)?
            .iter()
            .map(|feature| parse_feature(feature, context))
            .collect(),
        Some("Feature") => Ok(vec![parse_feature(value, context)?]),
        _ => Err(invalid(context, "expected a FeatureCollection")),
    }
}

fn parse_feature(value: &Value, context: &str) -> Result<GeoJsonFeature> {
    let geometry = match &value["geometry"] {
        Value::Null => None,
        geometry => Some(parse_geometry(geometry, context)?),
    };
    let properties = value["properties"].as_object().cloned().unwrap_or_default();
    let id = value.get("id").filter(|v| !v.is_null()).cloned();
    Ok(GeoJsonFeature {
        id,
        geometry,
        properties,
    })
}

fn array<'a>(value: &'a Value, context: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| invalid(context, "expected a coordinate array"))
}

fn parse_coord(value: &Value, context: &str) -> Result<Coord<f64>> {
    let pair = array(value, context)?;
    match (pair.first().and_then(Value::as_f64), pair.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(invalid(context, "coordinate must be [x, y] numbers")),
    }
}

fn parse_line(value: &Value, context: &str) -> Result<LineString<f64>> {
    let coords = array(value, context)?
        .iter()
        .map(|c| parse_coord(c, context))
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString(coords))
}

fn parse_polygon(value: &Value, context: &str) -> Result<Polygon<f64>> {
    let mut rings = array(value, context)?
        .iter()
        .map(|r| parse_line(r, context))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| invalid(context, "polygon without an exterior ring"))?;
    // Polygon::new closes open rings
    Ok(Polygon::new(exterior, rings.collect()))
}

fn invalid(context: &str, message: &str) -> GeoAssistError {
    GeoAssistError::dataset("parse_geojson", context, message)
}
