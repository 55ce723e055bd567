//! Entity stream over an OSM PBF snapshot.
//!
//! A scan decodes the file front to back. Per-kind predicates are applied
//! while decoding, so records that do not match are never materialized.
//! Scans do not rewind on their own: callers seek to the start with
//! [`EntityStream::rewind`] before every pass.

mod pbf;
#[cfg(test)]
pub mod fixture;
#[cfg(test)]
pub mod memory;

use crate::filter::TagLookup;
use crate::model::Entity;

pub use pbf::PbfStream;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode PBF: {0}")]
    Decode(#[from] osmpbf::Error),
    #[error("failed to start decoder pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Predicate applied to a record's ID and tags during decoding.
pub type RecordFilter<'f> = &'f (dyn Fn(i64, &dyn TagLookup) -> bool + Sync);

/// What a single scan should emit.
#[derive(Clone, Copy, Default)]
pub struct ScanOptions<'f> {
    pub node_filter: Option<RecordFilter<'f>>,
    pub way_filter: Option<RecordFilter<'f>>,
    pub relation_filter: Option<RecordFilter<'f>>,
    pub skip_nodes: bool,
    pub skip_ways: bool,
    pub skip_relations: bool,
}

impl<'f> ScanOptions<'f> {
    pub fn nodes(filter: RecordFilter<'f>) -> Self {
        ScanOptions {
            node_filter: Some(filter),
            skip_ways: true,
            skip_relations: true,
            ..Default::default()
        }
    }

    pub fn ways(filter: RecordFilter<'f>) -> Self {
        ScanOptions {
            way_filter: Some(filter),
            skip_nodes: true,
            skip_relations: true,
            ..Default::default()
        }
    }

    pub fn relations(filter: RecordFilter<'f>) -> Self {
        ScanOptions {
            relation_filter: Some(filter),
            skip_nodes: true,
            skip_ways: true,
            ..Default::default()
        }
    }

    pub fn wants_node(&self, id: i64, tags: &dyn TagLookup) -> bool {
        !self.skip_nodes && self.node_filter.is_none_or(|f| f(id, tags))
    }

    pub fn wants_way(&self, id: i64, tags: &dyn TagLookup) -> bool {
        !self.skip_ways && self.way_filter.is_none_or(|f| f(id, tags))
    }

    pub fn wants_relation(&self, id: i64, tags: &dyn TagLookup) -> bool {
        !self.skip_relations && self.relation_filter.is_none_or(|f| f(id, tags))
    }
}

pub type EntityIter<'a> = Box<dyn Iterator<Item = Result<Entity, ReadError>> + 'a>;

/// A rewindable, forward-only source of entities.
pub trait EntityStream {
    /// Seek back to the first record.
    fn rewind(&mut self) -> Result<(), ReadError>;

    /// Decode from the current position to the end of the stream, in order.
    fn scan<'a>(&'a mut self, options: ScanOptions<'a>) -> EntityIter<'a>;
}
