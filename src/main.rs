//! wp2git - Wikipedia article history to git
//!
//! Fetches the full revision history of a MediaWiki article and replays
//! it as one git commit per revision, preserving author, timestamp, and
//! edit-comment metadata.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    // Parse CLI args and run
    let cli = wp2git::cli::Cli::parse();
    wp2git::cli::run(cli)
}
