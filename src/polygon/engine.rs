use geo::BooleanOps;
use geo::orient::{Direction, Orient};
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use std::collections::VecDeque;

use super::{GeometryEngine, GeometryError};

/// Ends closer than this (in degrees) are treated as the same point.
const SNAP_TOLERANCE: f64 = 1e-7;

/// Geometry engine built on `geo`: segments are stitched into rings by
/// shared endpoints, rings are combined with even-odd semantics so nested
/// rings turn into holes, and set operations use `geo`'s boolean ops.
#[derive(Debug, Clone, Copy)]
pub struct GeoEngine {
    pub snap_tolerance: f64,
}

impl Default for GeoEngine {
    fn default() -> Self {
        Self {
            snap_tolerance: SNAP_TOLERANCE,
        }
    }
}

impl GeoEngine {
    fn near(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        (a.x - b.x).abs() <= self.snap_tolerance && (a.y - b.y).abs() <= self.snap_tolerance
    }

    fn stitch_rings(&self, lines: &MultiLineString<f64>) -> Result<Vec<Vec<Coord<f64>>>, GeometryError> {
        let mut pending: VecDeque<Vec<Coord<f64>>> = lines
            .iter()
            .filter(|line| line.0.len() >= 2)
            .map(|line| line.0.clone())
            .collect();
        let mut rings = Vec::new();

        while let Some(mut chain) = pending.pop_front() {
            let mut reversed = false;
            loop {
                let (first, last) = (chain[0], chain[chain.len() - 1]);
                if chain.len() > 2 && first == last {
                    break;
                }
                if let Some(next) = take_continuation(&mut pending, last) {
                    chain.extend(next.into_iter().skip(1));
                    continue;
                }
                if !reversed {
                    chain.reverse();
                    reversed = true;
                    continue;
                }
                if chain.len() > 2 && self.near(first, last) {
                    let end = chain.len() - 1;
                    chain[end] = first;
                    break;
                }
                return Err(GeometryError::DanglingSegment {
                    start: first,
                    end: last,
                });
            }

            if chain.len() < 4 {
                return Err(GeometryError::DegenerateRing(chain.len()));
            }
            rings.push(chain);
        }

        Ok(rings)
    }
}

/// Remove and return the pending segment that starts or ends at `at`,
/// oriented so that it starts there.
fn take_continuation(
    pending: &mut VecDeque<Vec<Coord<f64>>>,
    at: Coord<f64>,
) -> Option<Vec<Coord<f64>>> {
    let index = pending
        .iter()
        .position(|segment| segment[0] == at || segment[segment.len() - 1] == at)?;
    let mut segment = pending.remove(index)?;
    if segment[0] != at {
        segment.reverse();
    }
    Some(segment)
}

impl GeometryEngine for GeoEngine {
    fn polygonize(&self, lines: &MultiLineString<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        let mut rings = self.stitch_rings(lines)?.into_iter().map(|ring| {
            MultiPolygon::new(vec![Polygon::new(LineString::new(ring), vec![])])
        });

        let Some(first) = rings.next() else {
            return Ok(MultiPolygon::new(vec![]));
        };
        let area = rings.fold(first, |acc, ring| acc.xor(&ring));
        Ok(area.orient(Direction::Default))
    }

    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if b.0.is_empty() {
            return a.clone();
        }
        a.difference(b).orient(Direction::Default)
    }
}
