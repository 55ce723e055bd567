//! Polygon assembly for ways and multipolygon relations.

mod engine;

use geo_types::{Geometry, LineString, MultiPolygon, Polygon};

use crate::assemble::RoleGeometryGroup;

pub use engine::GeoEngine;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("no outer ways to build a boundary from")]
    MissingOuter,
    #[error("dangling segment from {start:?} to {end:?} does not close a ring")]
    DanglingSegment {
        start: geo_types::Coord<f64>,
        end: geo_types::Coord<f64>,
    },
    #[error("ring has only {0} coordinates")]
    DegenerateRing(usize),
}

/// Planar operations the polygon builder relies on.
pub trait GeometryEngine {
    /// Turn an unordered set of line segments into valid polygons.
    fn polygonize(
        &self,
        lines: &geo_types::MultiLineString<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError>;

    /// `a` minus `b`.
    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
}

/// Append the first coordinate when the line does not already end on it.
pub fn close_ring(mut line: LineString<f64>) -> LineString<f64> {
    if let (Some(&first), Some(&last)) = (line.0.first(), line.0.last())
        && first != last
    {
        line.0.push(first);
    }
    line
}

pub fn way_polygon(line: LineString<f64>) -> Polygon<f64> {
    Polygon::new(close_ring(line), vec![])
}

/// Build the area of a relation from its `outer` and `inner` role buckets.
pub fn build_relation_polygon<E: GeometryEngine>(
    engine: &E,
    roles: &RoleGeometryGroup,
) -> Result<Geometry<f64>, GeometryError> {
    let outer = roles
        .get("outer")
        .filter(|lines| !lines.0.is_empty())
        .ok_or(GeometryError::MissingOuter)?;

    let mut area = engine.polygonize(outer)?;
    if let Some(inner) = roles.get("inner") {
        let holes = engine.polygonize(inner)?;
        area = engine.difference(&area, &holes);
    }

    Ok(into_geometry(area))
}

fn into_geometry(mut area: MultiPolygon<f64>) -> Geometry<f64> {
    if area.0.len() == 1
        && let Some(polygon) = area.0.pop()
    {
        return Geometry::Polygon(polygon);
    }
    Geometry::MultiPolygon(area)
}
