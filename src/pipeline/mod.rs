use geo_types::{Geometry, Point};

use crate::model::{Node, Way};
use crate::polygon::{GeometryEngine, build_relation_polygon, way_polygon};
use crate::resolver::{Resolved, ResolvedRelation};
use crate::sinks::{FeatureId, FeatureRow};

/// Turn resolved entities into output features.
///
/// With `polygonize`, ways become polygons from their closed ring and each
/// relation becomes one area feature; a relation whose boundary cannot be
/// assembled is logged and left out. Without it, ways are line strings and
/// each relation yields one multi-line feature per role.
pub fn build_features<E: GeometryEngine>(
    resolved: Resolved,
    polygonize: bool,
    engine: &E,
) -> Vec<FeatureRow> {
    match resolved {
        Resolved::Nodes(nodes) => nodes.iter().map(node_feature).collect(),
        Resolved::Ways(ways) => ways
            .iter()
            .map(|way| way_feature(way, polygonize))
            .collect(),
        Resolved::Relations(relations) => {
            let mut rows = Vec::new();
            for resolved in &relations {
                if polygonize {
                    rows.extend(relation_area_feature(resolved, engine));
                } else {
                    rows.extend(relation_role_features(resolved));
                }
            }
            rows
        }
    }
}

pub fn node_feature(node: &Node) -> FeatureRow {
    FeatureRow::new(
        Geometry::Point(Point::from(node.coord())),
        FeatureId::Number(node.id),
        &node.tags,
    )
}

pub fn way_feature(way: &Way, polygonize: bool) -> FeatureRow {
    let line_string = way.line_string();
    let geometry = if polygonize {
        Geometry::Polygon(way_polygon(line_string))
    } else {
        Geometry::LineString(line_string)
    };
    FeatureRow::new(geometry, FeatureId::Number(way.id), &way.tags)
}

pub fn relation_role_features(resolved: &ResolvedRelation) -> Vec<FeatureRow> {
    let relation = &resolved.relation;
    resolved
        .roles
        .iter()
        .map(|(role, lines)| {
            FeatureRow::new(
                Geometry::MultiLineString(lines.clone()),
                FeatureId::role(relation.id, role),
                &relation.tags,
            )
        })
        .collect()
}

pub fn relation_area_feature<E: GeometryEngine>(
    resolved: &ResolvedRelation,
    engine: &E,
) -> Option<FeatureRow> {
    let relation = &resolved.relation;
    match build_relation_polygon(engine, &resolved.roles) {
        Ok(geometry) => Some(FeatureRow::new(
            geometry,
            FeatureId::Number(relation.id),
            &relation.tags,
        )),
        Err(err) => {
            tracing::warn!("relation {}: cannot build polygon: {}", relation.id, err);
            None
        }
    }
}
