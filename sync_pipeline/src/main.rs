// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Synchronous pipeline orchestration core: task generation, partial-run
//! marking and artifact recycling over an MLMD-like metadata store.
//!
//! `tick`, `mark-partial` and `recycle` are each a single bounded
//! operation against a pipeline IR file, so unlike a long-running
//! service this binary has no use for `sync_pipeline_bootstrap`'s
//! signal/shutdown coordination - it runs one command to completion and
//! exits.

mod application;
mod infrastructure;
mod presentation;

use infrastructure::{init_logging, OrchestratorConfig};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match sync_pipeline_bootstrap::parse_and_validate() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            return std::process::ExitCode::from(sync_pipeline_bootstrap::ExitCode::UsageError.as_i32() as u8);
        }
    };

    init_logging(cli.verbose);

    let config_path = cli.config.as_deref().map(|p| p.to_string_lossy().into_owned());
    let config = match OrchestratorConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error loading configuration: {e}");
            return std::process::ExitCode::from(sync_pipeline_bootstrap::ExitCode::Config.as_i32() as u8);
        }
    };

    sync_pipeline_bootstrap::result_to_exit_code(presentation::run(cli, config).await)
}
