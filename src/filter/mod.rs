//! Entity filters built from the command line.
//!
//! Syntax:
//!   --ids   1,2,3                 - entity ID membership
//!   --tags  key                   - tag exists
//!   --tags  key=value             - exact match
//!   --tags  key=/regex/           - value matches regular expression
//!   --tags  a,b=c,d=/^e/          - all of the above must hold
//!
//! Filters are typed by entity kind so a way ID list can never be applied
//! to nodes.

mod ids;
mod tags;

use std::fmt;
use std::str::FromStr;

pub use ids::IdFilter;
pub use tags::TagFilter;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid ID {token:?} in ID filter: {source}")]
    InvalidId {
        token: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid regular expression for tag {key:?}: {source}")]
    InvalidRegex {
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("{0}: unknown type (expected node, way, or relation)")]
    UnknownKind(String),
}

/// Key → value access over a record's tags, implemented both for decoder
/// records (before materialization) and for owned [`crate::model::Tags`].
pub trait TagLookup {
    fn tag(&self, key: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Way,
    Relation,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Way => "way",
            EntityKind::Relation => "relation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "node" => Ok(EntityKind::Node),
            "way" => Ok(EntityKind::Way),
            "relation" => Ok(EntityKind::Relation),
            other => Err(FilterError::UnknownKind(other.to_string())),
        }
    }
}

/// Conjunction of an optional ID filter and an optional tag filter.
/// With neither present every record matches.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    pub ids: Option<IdFilter>,
    pub tags: Option<TagFilter>,
}

impl Predicate {
    pub fn parse(ids: &str, tags: &str) -> Result<Self, FilterError> {
        Ok(Predicate {
            ids: IdFilter::parse(ids)?,
            tags: TagFilter::parse(tags)?,
        })
    }

    pub fn is_pass_through(&self) -> bool {
        self.ids.is_none() && self.tags.is_none()
    }

    pub fn matches(&self, id: i64, tags: &dyn TagLookup) -> bool {
        if let Some(ids) = &self.ids
            && !ids.contains(id)
        {
            return false;
        }
        match &self.tags {
            Some(filter) => filter.matches(tags),
            None => true,
        }
    }
}

/// A predicate tagged with the entity kind it applies to.
#[derive(Debug, Clone)]
pub enum Filter {
    Node(Predicate),
    Way(Predicate),
    Relation(Predicate),
}

impl Filter {
    pub fn build(kind: EntityKind, ids: &str, tags: &str) -> Result<Self, FilterError> {
        let predicate = Predicate::parse(ids, tags)?;
        Ok(match kind {
            EntityKind::Node => Filter::Node(predicate),
            EntityKind::Way => Filter::Way(predicate),
            EntityKind::Relation => Filter::Relation(predicate),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Filter::Node(_) => EntityKind::Node,
            Filter::Way(_) => EntityKind::Way,
            Filter::Relation(_) => EntityKind::Relation,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        match self {
            Filter::Node(p) | Filter::Way(p) | Filter::Relation(p) => p,
        }
    }
}
