// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Log subscriber setup.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::args::Args;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects `debug`, and the
/// default is `info`.
pub(crate) fn setup_logging(args: &Args) -> Result<()> {
    let level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
