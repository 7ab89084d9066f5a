// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `tracing-subscriber` initialization for the engine process. The
//! bootstrap crate's `BootstrapLogger` covers argument-parsing failures
//! that happen before this can run; everything from here on (ticks,
//! store I/O, task generation) logs through `tracing`.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber. `verbose` raises the default
/// filter from `info` to `debug`; `RUST_LOG` always wins when set.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = fmt().with_env_filter(filter).with_target(true).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed, skipping");
    }
}
