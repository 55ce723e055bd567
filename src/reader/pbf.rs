use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use osmpbf::{Blob, BlobDecode, BlobReader, Element, PrimitiveBlock, RelMemberType};
use rayon::prelude::*;

use super::{EntityIter, EntityStream, ReadError, ScanOptions};
use crate::filter::TagLookup;
use crate::model::{Entity, Member, MemberType, Node, Relation, Way, WayNode};

/// PBF snapshot read through a seekable source. Blobs are decoded on a
/// pool of `parallelism` threads, one batch of that many blobs at a time,
/// and handed out in file order.
pub struct PbfStream<R> {
    source: R,
    pool: rayon::ThreadPool,
    parallelism: usize,
}

impl PbfStream<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, parallelism: usize) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), parallelism)
    }
}

impl<R: Read + Seek + Send> PbfStream<R> {
    pub fn new(source: R, parallelism: usize) -> Result<Self, ReadError> {
        let parallelism = parallelism.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .thread_name(|i| format!("pbf-decode-{i}"))
            .build()?;
        Ok(Self {
            source,
            pool,
            parallelism,
        })
    }
}

impl<R: Read + Seek + Send> EntityStream for PbfStream<R> {
    fn rewind(&mut self) -> Result<(), ReadError> {
        self.source.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn scan<'a>(&'a mut self, options: ScanOptions<'a>) -> EntityIter<'a> {
        Box::new(PbfScan {
            blobs: BlobReader::new(&mut self.source),
            pool: &self.pool,
            batch_size: self.parallelism,
            options,
            pending: VecDeque::new(),
            done: false,
        })
    }
}

struct PbfScan<'a, R: Read + Send> {
    blobs: BlobReader<&'a mut R>,
    pool: &'a rayon::ThreadPool,
    batch_size: usize,
    options: ScanOptions<'a>,
    pending: VecDeque<Entity>,
    done: bool,
}

impl<R: Read + Send> PbfScan<'_, R> {
    /// Read the next batch of blobs and decode them in parallel. Returns
    /// `Ok(false)` once the stream is exhausted.
    fn fill(&mut self) -> Result<bool, ReadError> {
        let mut blobs = Vec::with_capacity(self.batch_size);
        while blobs.len() < self.batch_size {
            match self.blobs.next() {
                Some(blob) => blobs.push(blob?),
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if blobs.is_empty() {
            return Ok(false);
        }

        let options = self.options;
        let decoded: Vec<Result<Vec<Entity>, ReadError>> = self.pool.install(|| {
            blobs
                .into_par_iter()
                .map(|blob| decode_blob(&blob, &options))
                .collect()
        });

        for batch in decoded {
            self.pending.extend(batch?);
        }
        Ok(true)
    }
}

impl<R: Read + Send> Iterator for PbfScan<'_, R> {
    type Item = Result<Entity, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.pending.pop_front() {
                return Some(Ok(entity));
            }
            if self.done {
                return None;
            }
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(err) => {
                    self.done = true;
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

fn decode_blob(blob: &Blob, options: &ScanOptions) -> Result<Vec<Entity>, ReadError> {
    match blob.decode()? {
        BlobDecode::OsmHeader(_) => Ok(Vec::new()),
        BlobDecode::OsmData(block) => collect_block(&block, options),
        BlobDecode::Unknown(unknown) => {
            tracing::info!("Unknown blob: {}", unknown);
            Ok(Vec::new())
        }
    }
}

fn collect_block(block: &PrimitiveBlock, options: &ScanOptions) -> Result<Vec<Entity>, ReadError> {
    let mut entities = Vec::new();

    for element in block.elements() {
        match element {
            Element::Node(node) => {
                if options.wants_node(node.id(), &node) {
                    entities.push(Entity::Node(Node {
                        id: node.id(),
                        lat: node.lat(),
                        lon: node.lon(),
                        tags: node.tags().collect(),
                    }));
                }
            }
            Element::DenseNode(node) => {
                if options.wants_node(node.id(), &node) {
                    entities.push(Entity::Node(Node {
                        id: node.id(),
                        lat: node.lat(),
                        lon: node.lon(),
                        tags: node.tags().collect(),
                    }));
                }
            }
            Element::Way(way) => {
                if options.wants_way(way.id(), &way) {
                    entities.push(Entity::Way(Way {
                        id: way.id(),
                        nodes: way.refs().map(WayNode::unresolved).collect(),
                        tags: way.tags().collect(),
                    }));
                }
            }
            Element::Relation(relation) => {
                if options.wants_relation(relation.id(), &relation) {
                    let mut members = Vec::new();
                    for member in relation.members() {
                        members.push(Member {
                            member_type: match member.member_type {
                                RelMemberType::Node => MemberType::Node,
                                RelMemberType::Way => MemberType::Way,
                                RelMemberType::Relation => MemberType::Relation,
                            },
                            id: member.member_id,
                            role: member.role()?.to_string(),
                        });
                    }
                    entities.push(Entity::Relation(Relation {
                        id: relation.id(),
                        members,
                        tags: relation.tags().collect(),
                    }));
                }
            }
        }
    }

    Ok(entities)
}

impl TagLookup for osmpbf::Node<'_> {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl TagLookup for osmpbf::DenseNode<'_> {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl TagLookup for osmpbf::Way<'_> {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl TagLookup for osmpbf::Relation<'_> {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}
