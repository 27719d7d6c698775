// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Refined k-nearest-neighbor search over building footprints.
//!
//! Generates a synthetic footprint dataset, indexes the footprint envelopes
//! twice (sequential insertion, then bulk loading) and compares build times.
//! Then it answers two questions with the bulk-loaded tree:
//!
//! - which `k` footprints are closest to a query point, ranked by exact
//!   polygon distance rather than envelope distance;
//! - which footprints surround an anchor, split into its box-nearest
//!   neighbors and the rest of a square window around it.
//!
//! ```sh
//! cargo run -p mbr_demos --release -- --count 200000 -k 10 --debug
//! ```

mod args;
mod buildings;
mod config;
mod logging;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use mbr_index::{BoundingBox, Dataset, Role, SpatialIndex};
use tracing::info;

use crate::args::Args;
use crate::buildings::Buildings;
use crate::config::DemoConfig;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(&args)?;
    let config = DemoConfig::from_args(&args)?;
    run(&config)
}

fn run(config: &DemoConfig) -> Result<()> {
    let start = Instant::now();
    let buildings = Buildings::generate(&config.dataset);
    let Some(roi) = buildings.bounds() else {
        info!("dataset is empty, nothing to index");
        return Ok(());
    };
    info!(footprints = buildings.len(), elapsed = ?start.elapsed(), "generated dataset");
    info!("MBR of dataset: {roi}");

    let start = Instant::now();
    let mut sequential = SpatialIndex::with_params(config.index)?;
    sequential
        .insert_all(buildings.envelopes())
        .context("indexing footprints one by one")?;
    info!(
        height = sequential.height(),
        elapsed = ?start.elapsed(),
        "sequential R-tree"
    );

    let start = Instant::now();
    let index = SpatialIndex::bulk_load_with_params(buildings.envelopes(), config.index)
        .context("bulk-loading footprints")?;
    info!(
        height = index.height(),
        elapsed = ?start.elapsed(),
        "bulk-loaded R-tree"
    );

    let query = &config.query;
    let p = query.point();
    info!(point = ?p, k = query.k, fetch = ?query.fetch, "nearest footprints by polygon distance");
    let ranked = index.nearest_refined(p, query.k, query.fetch, |id, q| {
        buildings.exact_distance(id, q)
    });
    for (rank, r) in ranked.iter().enumerate() {
        let building = buildings.get(r.entry.id).map_or(0, |f| f.building);
        info!(
            "{rank}\tbuilding {building}\tdistance {:.6}\t(box {:.6})",
            r.distance, r.box_distance
        );
    }

    let anchor = query.anchor();
    let window = BoundingBox::around(anchor, query.radius);
    info!(anchor = ?anchor, "neighborhood window {window}");
    let neighborhood = index.query_neighborhood(anchor, query.neighborhood_k, query.radius);
    let nearest = neighborhood
        .iter()
        .filter(|(role, _)| *role == Role::Nearest)
        .count();
    info!(
        nearest,
        in_range = neighborhood.len() - nearest,
        "classified neighborhood footprints"
    );
    Ok(())
}
