use regex::Regex;
use std::mem;

use super::{FilterError, TagLookup};

/// One constraint on a tag key.
#[derive(Debug, Clone)]
pub enum TagConstraint {
    /// `key`
    Present,
    /// `key=value`
    Equals(String),
    /// `key=/pattern/`
    Matches(Regex),
}

impl TagConstraint {
    fn accepts(&self, value: &str) -> bool {
        match self {
            TagConstraint::Present => true,
            TagConstraint::Equals(expected) => value == expected,
            TagConstraint::Matches(regex) => regex.is_match(value),
        }
    }
}

/// Conjunction of tag constraints, checked in the order given.
///
/// A key holds at most one constraint of each kind: a later `key=value`
/// replaces an earlier one for the same key, and likewise for
/// `key=/regex/`. Constraints of different kinds on one key all apply.
#[derive(Debug, Clone)]
pub struct TagFilter {
    constraints: Vec<(String, TagConstraint)>,
}

impl TagFilter {
    /// Parse a comma-separated list of `key`, `key=value` and `key=/regex/`
    /// entries. An empty list means no filter.
    pub fn parse(list: &str) -> Result<Option<Self>, FilterError> {
        if list.is_empty() {
            return Ok(None);
        }

        let mut constraints: Vec<(String, TagConstraint)> = Vec::new();
        for pair in list.split(',') {
            let (key, constraint) = match pair.split_once('=') {
                None => (pair, TagConstraint::Present),
                Some((key, value))
                    if value.len() >= 2 && value.starts_with('/') && value.ends_with('/') =>
                {
                    let pattern = &value[1..value.len() - 1];
                    let regex = Regex::new(pattern).map_err(|source| FilterError::InvalidRegex {
                        key: key.to_string(),
                        source,
                    })?;
                    (key, TagConstraint::Matches(regex))
                }
                Some((key, value)) => (key, TagConstraint::Equals(value.to_string())),
            };
            let same_kind = constraints.iter_mut().find(|(k, c)| {
                k == key && mem::discriminant(c) == mem::discriminant(&constraint)
            });
            match same_kind {
                Some((_, existing)) => *existing = constraint,
                None => constraints.push((key.to_string(), constraint)),
            }
        }

        Ok(Some(TagFilter { constraints }))
    }

    pub fn matches(&self, tags: &dyn TagLookup) -> bool {
        self.constraints
            .iter()
            .all(|(key, constraint)| match tags.tag(key) {
                Some(value) => constraint.accepts(value),
                None => false,
            })
    }
}
