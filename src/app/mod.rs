use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::{ExtractConfig, Overrides, RuntimeConfig};
use crate::filter::Filter;
use crate::pipeline::build_features;
use crate::polygon::GeoEngine;
use crate::reader::PbfStream;
use crate::resolver::Resolver;
use crate::sinks::{DataSink, GeoJsonSink};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Entity type to extract: node, way or relation
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Input PBF file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output GeoJSON file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated entity IDs
    #[arg(long)]
    pub ids: Option<String>,

    /// Comma-separated tag filters: key, key=value or key=/regex/
    #[arg(long)]
    pub tags: Option<String>,

    /// Build areas from closed ways and multipolygon relations
    #[arg(long)]
    pub polygonize: bool,

    /// Number of decode threads (default: all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write the FeatureCollection on a single line
    #[arg(long)]
    pub compact: bool,

    /// Configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            kind: self.kind.clone(),
            ids: self.ids.clone(),
            tags: self.tags.clone(),
            polygonize: self.polygonize,
            jobs: self.jobs,
            compact: self.compact,
        }
    }
}

pub fn init_sink(output: Option<&Path>, compact: bool) -> Result<Box<dyn DataSink>> {
    match output {
        Some(path) if path != Path::new("-") => {
            let sink = GeoJsonSink::new(path, compact)
                .with_context(|| format!("Sink: Failed to create {}", path.display()))?;
            Ok(Box::new(sink))
        }
        _ => Ok(Box::new(GeoJsonSink::stdout(compact))),
    }
}

/// Runs one extraction and returns the number of features written.
pub fn run(cli: &Cli) -> Result<usize> {
    let file_config = ExtractConfig::load(cli.config.as_deref())?;
    let runtime = RuntimeConfig::resolve(cli.overrides(), file_config)?;

    let filter = Filter::build(runtime.kind, &runtime.ids, &runtime.tags)
        .context("CLI: Invalid filter")?;
    tracing::info!(
        "Extracting {}s (ids: {:?}, tags: {:?}, polygonize: {}, jobs: {})",
        filter.kind(),
        runtime.ids,
        runtime.tags,
        runtime.polygonize,
        runtime.jobs
    );
    if filter.predicate().is_pass_through() {
        tracing::warn!("No ids or tags given; every {} will be extracted", filter.kind());
    }

    let stream = PbfStream::open(&cli.input, runtime.jobs)
        .with_context(|| format!("Resolver: Failed to open {}", cli.input.display()))?;
    let mut resolver = Resolver::new(stream).with_progress(cli.verbose);
    let resolved = resolver
        .resolve(&filter)
        .with_context(|| format!("Resolver: Failed to read {}", cli.input.display()))?;
    drop(resolver);
    if resolved.is_empty() {
        tracing::warn!("No {} matched the filter", filter.kind());
    } else {
        tracing::info!("Resolved {} {}s", resolved.len(), filter.kind());
    }

    let rows = build_features(resolved, runtime.polygonize, &GeoEngine::default());
    let count = rows.len();

    let mut sink = init_sink(cli.output.as_deref(), runtime.compact)?;
    for row in rows {
        let id = row.id.clone();
        sink.add_feature(row)
            .with_context(|| format!("Sink: Failed to add feature {id}"))?;
    }
    sink.finish().context("Sink: Failed to write output")?;

    Ok(count)
}
