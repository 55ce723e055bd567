use std::collections::HashSet;

use super::FilterError;

/// Set of requested entity IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilter {
    ids: HashSet<i64>,
}

impl IdFilter {
    /// Parse a comma-separated ID list. An empty list means no filter.
    pub fn parse(list: &str) -> Result<Option<Self>, FilterError> {
        if list.trim().is_empty() {
            return Ok(None);
        }

        let ids = list
            .split(',')
            .map(|token| {
                let token = token.trim();
                token.parse::<i64>().map_err(|source| FilterError::InvalidId {
                    token: token.to_string(),
                    source,
                })
            })
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(Some(IdFilter { ids }))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
