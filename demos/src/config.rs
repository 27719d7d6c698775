// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demo configuration, read from TOML and overridden by CLI flags.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. The defaults mirror a city-scale building dataset in
//! longitude/latitude degrees.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use mbr_index::{BoundingBox, FetchPolicy, Params, Point};
use serde::{Deserialize, Serialize};

use crate::args::Args;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DemoConfig {
    /// Node fanout of the R-tree.
    pub(crate) index: Params,
    pub(crate) dataset: DatasetSettings,
    pub(crate) query: QuerySettings,
}

/// Synthetic footprint generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DatasetSettings {
    pub(crate) count: usize,
    pub(crate) seed: u64,
    /// Region the footprint centers are drawn from.
    pub(crate) region: BoundingBox,
    /// Footprint radius range, in region units.
    pub(crate) min_size: f64,
    pub(crate) max_size: f64,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            count: 50_000,
            seed: 0x05ee_d5ee,
            region: BoundingBox::new(-77.12, 38.80, -76.91, 38.99),
            min_size: 0.000_05,
            max_size: 0.000_4,
        }
    }
}

/// Query knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct QuerySettings {
    /// Query point of the refined nearest-neighbor search, `[x, y]`.
    pub(crate) point: [f64; 2],
    pub(crate) k: usize,
    pub(crate) fetch: FetchPolicy,
    /// Center of the neighborhood query, `[x, y]`.
    pub(crate) anchor: [f64; 2],
    /// Box-nearest entries tagged as the anchor's nearest.
    pub(crate) neighborhood_k: usize,
    /// Half-side of the neighborhood window.
    pub(crate) radius: f64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            point: [-76.8117, 38.812],
            k: 10,
            fetch: FetchPolicy::Adaptive,
            anchor: [-76.99017, 38.88970],
            neighborhood_k: 200,
            radius: 0.03,
        }
    }
}

impl DatasetSettings {
    /// Reject settings the footprint generator cannot sample from.
    pub(crate) fn validate(&self) -> Result<()> {
        let r = &self.region;
        ensure!(
            self.region.is_valid(),
            "dataset region {} is inverted or has a NaN coordinate",
            self.region
        );
        ensure!(
            [r.min_x, r.min_y, r.max_x, r.max_y, self.min_size, self.max_size]
                .iter()
                .all(|v| v.is_finite()),
            "dataset region and sizes must be finite"
        );
        ensure!(
            self.min_size <= self.max_size,
            "dataset min_size ({}) must not exceed max_size ({})",
            self.min_size,
            self.max_size
        );
        Ok(())
    }
}

impl QuerySettings {
    pub(crate) fn point(&self) -> Point {
        Point::new(self.point[0], self.point[1])
    }

    pub(crate) fn anchor(&self) -> Point {
        Point::new(self.anchor[0], self.anchor[1])
    }
}

impl DemoConfig {
    /// Load the file named by `--config` (defaults when absent) and apply
    /// the remaining CLI overrides.
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        config.dataset.validate()?;
        Ok(config)
    }

    pub(crate) fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn apply_overrides(&mut self, args: &Args) {
        if let Some(count) = args.count {
            self.dataset.count = count;
        }
        if let Some(seed) = args.seed {
            self.dataset.seed = seed;
        }
        if let Some(k) = args.k {
            self.query.k = k;
        }
        if let Some(factor) = args.fetch_factor {
            self.query.fetch = FetchPolicy::Factor(factor);
        }
        if let Some(radius) = args.radius {
            self.query.radius = radius;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config: DemoConfig = toml::from_str("").unwrap();
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.index, Params::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config: DemoConfig = toml::from_str(
            r#"
            [index]
            max_children = 8

            [dataset]
            count = 1000
            region = { min_x = 0.0, min_y = 0.0, max_x = 10.0, max_y = 10.0 }

            [query]
            fetch = { factor = 20 }
            "#,
        )
        .unwrap();
        assert_eq!(config.index.max_children(), 8);
        assert_eq!(config.index.min_children(), Params::DEFAULT_MIN_CHILDREN);
        assert_eq!(config.dataset.count, 1000);
        assert_eq!(config.dataset.region, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(config.dataset.seed, DatasetSettings::default().seed);
        assert_eq!(config.query.fetch, FetchPolicy::Factor(20));
        assert_eq!(config.query.k, 10);
    }

    #[test]
    fn adaptive_policy_by_name() {
        let config: DemoConfig = toml::from_str("[query]\nfetch = \"adaptive\"\n").unwrap();
        assert_eq!(config.query.fetch, FetchPolicy::Adaptive);
    }

    #[test]
    fn rejects_unsampleable_dataset() {
        let config: DemoConfig =
            toml::from_str("[dataset]\ncount = 5\nmin_size = 0.5\nmax_size = 0.1\n").unwrap();
        let err = config.dataset.validate().unwrap_err();
        assert!(err.to_string().contains("min_size"), "unexpected error: {err}");

        let config: DemoConfig = toml::from_str(
            "[dataset]\nregion = { min_x = 1.0, min_y = 0.0, max_x = 0.0, max_y = 1.0 }\n",
        )
        .unwrap();
        assert!(config.dataset.validate().is_err());

        let unbounded = DatasetSettings {
            region: BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0),
            ..DatasetSettings::default()
        };
        assert!(unbounded.validate().is_err());

        assert!(DatasetSettings::default().validate().is_ok());
    }

    #[test]
    fn from_args_surfaces_invalid_file() {
        let path = std::env::temp_dir().join(format!("knn_refine_invalid_{}.toml", std::process::id()));
        fs::write(&path, "[dataset]\nmin_size = 2.0\nmax_size = 1.0\n").unwrap();
        let args = Args {
            config: Some(path.clone()),
            ..Args::default()
        };
        let result = DemoConfig::from_args(&args);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn cli_overrides_file() {
        let args = Args {
            count: Some(12),
            fetch_factor: Some(5),
            radius: Some(1.5),
            ..Args::default()
        };
        let mut config = DemoConfig::default();
        config.apply_overrides(&args);
        assert_eq!(config.dataset.count, 12);
        assert_eq!(config.query.fetch, FetchPolicy::Factor(5));
        assert_eq!(config.query.radius, 1.5);
        assert_eq!(config.query.k, 10);
    }
}
