//! Owned entity records materialized from the snapshot.
//!
//! Only records that passed their scan predicate are ever built, so these
//! types hold the match set rather than the whole file.

use geo_types::{Coord, LineString};

use crate::filter::TagLookup;

/// Tags in the order they were decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Tags {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Tags(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl TagLookup for Tags {
    fn tag(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

impl Node {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// A node reference inside a way. `location` stays `None` until the node
/// is found in a later pass, and forever if the snapshot lacks it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WayNode {
    pub id: i64,
    pub location: Option<Coord<f64>>,
}

impl WayNode {
    pub fn unresolved(id: i64) -> Self {
        WayNode { id, location: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<WayNode>,
    pub tags: Tags,
}

impl Way {
    pub fn node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Resolved vertices in order. Unresolved references are left out.
    pub fn line_string(&self) -> LineString<f64> {
        self.nodes.iter().filter_map(|n| n.location).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub member_type: MemberType,
    pub id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<Member>,
    pub tags: Tags,
}

impl Relation {
    pub fn way_member_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.members
            .iter()
            .filter(|m| m.member_type == MemberType::Way)
            .map(|m| m.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Node(Node),
    Way(Way),
    Relation(Relation),
}
