// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Build an index over synthetic building footprints, then run refined
/// nearest-neighbor and neighborhood queries against it.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Number of footprints to generate.
    #[arg(short = 'n', long)]
    pub(crate) count: Option<usize>,

    /// Seed for the footprint generator.
    #[arg(short, long)]
    pub(crate) seed: Option<u64>,

    /// Number of refined nearest neighbors to report.
    #[arg(short)]
    pub(crate) k: Option<usize>,

    /// Examine `k * FACTOR` box candidates instead of fetching adaptively.
    #[arg(long, value_name = "FACTOR")]
    pub(crate) fetch_factor: Option<usize>,

    /// Half-side of the neighborhood window around the anchor.
    #[arg(short, long)]
    pub(crate) radius: Option<f64>,

    /// Enable debug logging.
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long)]
    pub(crate) debug: bool,
}
