use anyhow::Result;
use geo_types::Geometry;
use serde_json::{Map, Value};
use std::fmt;

pub mod geojson;

pub use self::geojson::GeoJsonSink;

use crate::model::Tags;

/// Feature identifier: the entity ID, or `"{relation}:{role}"` for the
/// per-role features of a relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureId {
    Number(i64),
    String(String),
}

impl FeatureId {
    pub fn role(relation_id: i64, role: &str) -> Self {
        FeatureId::String(format!("{relation_id}:{role}"))
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(id) => write!(f, "{id}"),
            FeatureId::String(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FeatureRow {
    pub geometry: Geometry<f64>,
    pub id: FeatureId,
    pub properties: Map<String, Value>,
}

impl FeatureRow {
    pub fn new(geometry: Geometry<f64>, id: FeatureId, tags: &Tags) -> Self {
        Self {
            geometry,
            id,
            properties: tag_properties(tags),
        }
    }
}

pub fn tag_properties(tags: &Tags) -> Map<String, Value> {
    tags.iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

pub trait DataSink {
    fn add_feature(&mut self, row: FeatureRow) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}
