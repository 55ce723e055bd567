//! Multi-pass resolution of entities against a forward-only stream.
//!
//! The snapshot stores nodes, then ways, then relations, and only refers
//! downwards by ID. Each pass rewinds the stream, scans one kind, and
//! collects the IDs the next pass has to look for:
//!
//!   nodes:     nodes
//!   ways:      ways -> nodes
//!   relations: relations -> ways -> nodes
//!
//! ID sets and lookups are complete and read-only before the next pass
//! starts.

use std::collections::{HashMap, HashSet};

use crate::assemble::{RoleGeometryGroup, assemble_roles};
use crate::filter::{Filter, Predicate, TagLookup};
use crate::model::{Entity, Node, Relation, Way};
use crate::reader::{EntityStream, ReadError, ScanOptions};
use crate::storage::NodeLocations;
use crate::utils::ProgressCounter;

/// A matched relation with its way members grouped by role.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelation {
    pub relation: Relation,
    pub roles: RoleGeometryGroup,
}

/// Matches for one filter, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Nodes(Vec<Node>),
    Ways(Vec<Way>),
    Relations(Vec<ResolvedRelation>),
}

impl Resolved {
    pub fn len(&self) -> usize {
        match self {
            Resolved::Nodes(nodes) => nodes.len(),
            Resolved::Ways(ways) => ways.len(),
            Resolved::Relations(relations) => relations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct Resolver<S> {
    stream: S,
    progress: bool,
}

impl<S: EntityStream> Resolver<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            progress: false,
        }
    }

    /// Draw a per-pass match counter on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    #[cfg(test)]
    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn resolve(&mut self, filter: &Filter) -> Result<Resolved, ReadError> {
        match filter {
            Filter::Node(predicate) => self.find_nodes(predicate).map(Resolved::Nodes),
            Filter::Way(predicate) => self.find_ways(predicate).map(Resolved::Ways),
            Filter::Relation(predicate) => {
                self.find_relations(predicate).map(Resolved::Relations)
            }
        }
    }

    pub fn find_nodes(&mut self, predicate: &Predicate) -> Result<Vec<Node>, ReadError> {
        let matches = |id: i64, tags: &dyn TagLookup| predicate.matches(id, tags);
        let mut nodes = Vec::new();
        self.pass("Nodes", ScanOptions::nodes(&matches), |entity| {
            if let Entity::Node(node) = entity {
                nodes.push(node);
            }
        })?;
        Ok(nodes)
    }

    pub fn find_ways(&mut self, predicate: &Predicate) -> Result<Vec<Way>, ReadError> {
        let matches = |id: i64, tags: &dyn TagLookup| predicate.matches(id, tags);
        let mut ways = Vec::new();
        let mut node_ids = HashSet::new();
        self.pass("Pass 1/2: ways", ScanOptions::ways(&matches), |entity| {
            if let Entity::Way(way) = entity {
                node_ids.extend(way.node_ids());
                ways.push(way);
            }
        })?;

        let nodes = self.collect_nodes("Pass 2/2: nodes", &node_ids)?;
        for way in &mut ways {
            resolve_way(way, &nodes);
        }
        Ok(ways)
    }

    pub fn find_relations(
        &mut self,
        predicate: &Predicate,
    ) -> Result<Vec<ResolvedRelation>, ReadError> {
        let matches = |id: i64, tags: &dyn TagLookup| predicate.matches(id, tags);
        let mut relations = Vec::new();
        let mut way_ids = HashSet::new();
        self.pass(
            "Pass 1/3: relations",
            ScanOptions::relations(&matches),
            |entity| {
                if let Entity::Relation(relation) = entity {
                    way_ids.extend(relation.way_member_ids());
                    relations.push(relation);
                }
            },
        )?;

        let mut ways: HashMap<i64, Vec<i64>> = HashMap::with_capacity(way_ids.len());
        let mut node_ids = HashSet::new();
        if way_ids.is_empty() {
            tracing::info!("Pass 2/3: ways: skipped, no way members");
        } else {
            let wanted = |id: i64, _: &dyn TagLookup| way_ids.contains(&id);
            self.pass("Pass 2/3: ways", ScanOptions::ways(&wanted), |entity| {
                if let Entity::Way(way) = entity {
                    let refs: Vec<i64> = way.node_ids().collect();
                    node_ids.extend(refs.iter().copied());
                    ways.insert(way.id, refs);
                }
            })?;
        }

        let nodes = self.collect_nodes("Pass 3/3: nodes", &node_ids)?;

        Ok(relations
            .into_iter()
            .map(|relation| {
                let roles = assemble_roles(&relation, &ways, &nodes);
                ResolvedRelation { relation, roles }
            })
            .collect())
    }

    /// Scan nodes whose ID is in `wanted` into a coordinate lookup.
    fn collect_nodes(
        &mut self,
        label: &'static str,
        wanted: &HashSet<i64>,
    ) -> Result<NodeLocations, ReadError> {
        let mut nodes = NodeLocations::with_capacity(wanted.len());
        if wanted.is_empty() {
            tracing::info!("{}: skipped, no node references", label);
            return Ok(nodes);
        }

        let in_set = |id: i64, _: &dyn TagLookup| wanted.contains(&id);
        self.pass(label, ScanOptions::nodes(&in_set), |entity| {
            if let Entity::Node(node) = entity {
                nodes.put(node.id, node.lat, node.lon);
            }
        })?;

        let missing = nodes.missing(wanted).count();
        if missing > 0 {
            tracing::warn!(
                "{} of {} referenced nodes not found in snapshot",
                missing,
                wanted.len()
            );
        }
        Ok(nodes)
    }

    /// Rewind, then feed every entity the scan emits to `visit`.
    fn pass(
        &mut self,
        label: &'static str,
        options: ScanOptions<'_>,
        mut visit: impl FnMut(Entity),
    ) -> Result<u64, ReadError> {
        self.stream.rewind()?;

        let mut progress = self.progress.then(|| ProgressCounter::new(label, 10_000));
        let mut count = 0u64;
        for entity in self.stream.scan(options) {
            visit(entity?);
            count += 1;
            if let Some(progress) = progress.as_mut() {
                progress.inc(1);
            }
        }
        if let Some(progress) = progress {
            progress.finish();
        }

        tracing::info!("{}: {} matched", label, count);
        Ok(count)
    }
}

/// Attach coordinates to every reference of `way` found in `nodes`.
/// References to absent nodes keep `location: None`.
fn resolve_way(way: &mut Way, nodes: &NodeLocations) {
    for node in way.nodes.iter_mut() {
        match nodes.get(node.id) {
            Some(coord) => node.location = Some(coord),
            None => tracing::warn!("way {}: node {}: not found", way.id, node.id),
        }
    }
}
