//! Grouping of a relation's way members into per-role line geometries.

use geo_types::{LineString, MultiLineString};
use std::collections::HashMap;

use crate::model::{MemberType, Relation};
use crate::storage::NodeLocations;

/// Role → lines contributed by the way members with that role.
///
/// Roles keep the order in which they first appear in the member list, and
/// lines keep member order within a role, so downstream polygon assembly is
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleGeometryGroup {
    roles: Vec<(String, MultiLineString<f64>)>,
}

impl RoleGeometryGroup {
    pub fn push(&mut self, role: &str, line: LineString<f64>) {
        match self.roles.iter_mut().find(|(r, _)| r == role) {
            Some((_, lines)) => lines.0.push(line),
            None => self
                .roles
                .push((role.to_string(), MultiLineString::new(vec![line]))),
        }
    }

    pub fn get(&self, role: &str) -> Option<&MultiLineString<f64>> {
        self.roles
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, lines)| lines)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MultiLineString<f64>)> {
        self.roles.iter().map(|(role, lines)| (role.as_str(), lines))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Build the role buckets of `relation` from the ways and node locations
/// gathered by the previous passes.
///
/// Members that are not ways are ignored. A way missing from `ways` skips
/// its member, and a node missing from `nodes` drops that vertex; both are
/// logged and neither is an error.
pub fn assemble_roles(
    relation: &Relation,
    ways: &HashMap<i64, Vec<i64>>,
    nodes: &NodeLocations,
) -> RoleGeometryGroup {
    let mut group = RoleGeometryGroup::default();

    for member in &relation.members {
        if member.member_type != MemberType::Way {
            continue;
        }
        let Some(node_ids) = ways.get(&member.id) else {
            tracing::warn!("relation {}: way {}: not found", relation.id, member.id);
            continue;
        };

        let mut coords = Vec::with_capacity(node_ids.len());
        for &node_id in node_ids {
            match nodes.get(node_id) {
                Some(coord) => coords.push(coord),
                None => tracing::warn!(
                    "relation {}: way {}: node {}: not found",
                    relation.id,
                    member.id,
                    node_id
                ),
            }
        }
        group.push(&member.role, LineString::new(coords));
    }

    group
}
