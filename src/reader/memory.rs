//! In-memory entity stream for tests.

use super::{EntityIter, EntityStream, ReadError, ScanOptions};
use crate::model::Entity;

/// Behaves like a file positioned at its end after every scan: a second
/// scan without [`EntityStream::rewind`] yields nothing.
pub struct MemoryStream {
    entities: Vec<Entity>,
    at_start: bool,
    pub rewinds: usize,
    pub scans: usize,
}

impl MemoryStream {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            at_start: false,
            rewinds: 0,
            scans: 0,
        }
    }
}

impl EntityStream for MemoryStream {
    fn rewind(&mut self) -> Result<(), ReadError> {
        self.at_start = true;
        self.rewinds += 1;
        Ok(())
    }

    fn scan<'a>(&'a mut self, options: ScanOptions<'a>) -> EntityIter<'a> {
        self.scans += 1;
        if !std::mem::replace(&mut self.at_start, false) {
            return Box::new(std::iter::empty());
        }
        Box::new(
            self.entities
                .iter()
                .filter(move |entity| match entity {
                    Entity::Node(node) => options.wants_node(node.id, &node.tags),
                    Entity::Way(way) => options.wants_way(way.id, &way.tags),
                    Entity::Relation(relation) => {
                        options.wants_relation(relation.id, &relation.tags)
                    }
                })
                .cloned()
                .map(Ok),
        )
    }
}
