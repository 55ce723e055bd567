use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::filter::EntityKind;

/// Extraction defaults from an optional YAML file and `OSMEXTRACT_*`
/// environment variables. Every field can be overridden on the command
/// line.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractConfig {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub ids: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub polygonize: Option<bool>,
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub compact: Option<bool>,
}

impl ExtractConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix("OSMEXTRACT"))
            .build()
            .context("Config: Failed to load configuration")?;
        settings
            .try_deserialize()
            .context("Config: Invalid configuration")
    }
}

/// Command-line values that override [`ExtractConfig`].
#[derive(Debug, Default)]
pub struct Overrides {
    pub kind: Option<String>,
    pub ids: Option<String>,
    pub tags: Option<String>,
    pub polygonize: bool,
    pub jobs: Option<usize>,
    pub compact: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub kind: EntityKind,
    pub ids: String,
    pub tags: String,
    pub polygonize: bool,
    pub jobs: usize,
    pub compact: bool,
}

impl RuntimeConfig {
    pub fn resolve(overrides: Overrides, file: ExtractConfig) -> Result<Self> {
        let kind = overrides
            .kind
            .or(file.kind)
            .context("Config: No entity type given; use --type node|way|relation")?;
        let kind: EntityKind = kind.parse()?;

        Ok(RuntimeConfig {
            kind,
            ids: overrides.ids.or(file.ids).unwrap_or_default(),
            tags: overrides.tags.or(file.tags).unwrap_or_default(),
            polygonize: overrides.polygonize || file.polygonize.unwrap_or(false),
            jobs: overrides
                .jobs
                .or(file.jobs)
                .unwrap_or_else(default_jobs)
                .max(1),
            compact: overrides.compact || file.compact.unwrap_or(false),
        })
    }
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
