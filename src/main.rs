mod app;
mod assemble;
mod config;
mod filter;
mod model;
mod pipeline;
mod polygon;
mod reader;
mod resolver;
mod sinks;
mod storage;
mod utils;

use anyhow::Result;
use clap::Parser;

use app::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let start = std::time::Instant::now();
    let feature_count = run(&cli)?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Written {} features in {:.2}s",
        feature_count,
        elapsed.as_secs_f64()
    );

    Ok(())
}
