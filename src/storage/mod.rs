use geo_types::Coord;
use std::collections::{HashMap, HashSet};

/// Coordinates of the nodes collected during a node pass, keyed by node ID.
///
/// Only nodes referenced by the ways of interest are stored, so the size is
/// bounded by the match set rather than the snapshot.
#[derive(Debug, Default, Clone)]
pub struct NodeLocations {
    nodes: HashMap<i64, Coord<f64>>,
}

impl NodeLocations {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: HashMap::with_capacity(capacity),
        }
    }

    pub fn put(&mut self, id: i64, lat: f64, lon: f64) {
        self.nodes.insert(id, Coord { x: lon, y: lat });
    }

    pub fn get(&self, id: i64) -> Option<Coord<f64>> {
        self.nodes.get(&id).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// IDs from `wanted` that no node pass delivered.
    pub fn missing<'a>(&'a self, wanted: &'a HashSet<i64>) -> impl Iterator<Item = i64> + 'a {
        wanted
            .iter()
            .copied()
            .filter(|id| !self.nodes.contains_key(id))
    }
}
