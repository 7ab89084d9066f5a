// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CLI structure and clap parsing. This module only describes the shape
//! of the command line; security validation happens in `validator`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Synchronous pipeline orchestration core: task generation, partial-run
/// marking and artifact recycling over a metadata store.
#[derive(Debug, Parser)]
#[command(name = "sync-pipeline", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite metadata store database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one generation tick over a pipeline IR and print the tasks
    /// it produces.
    Tick {
        /// Path to the pipeline IR, as JSON.
        pipeline_ir: PathBuf,
        /// Run id to scope this tick's pipeline-run context to.
        #[arg(long)]
        pipeline_run_id: Option<String>,
        /// Compute and print tasks without writing to the metadata
        /// store.
        #[arg(long)]
        dry_run: bool,
    },
    /// Mark a pipeline IR for a partial run: which nodes to run, which
    /// to skip-but-include, and nominate the chief node.
    MarkPartial {
        /// Path to the pipeline IR, as JSON.
        pipeline_ir: PathBuf,
        /// Node ids to run (repeatable).
        #[arg(long = "from-node", required = true)]
        from_nodes: Vec<String>,
        /// Node ids to run up to (repeatable). Defaults to every
        /// terminal node when omitted.
        #[arg(long = "to-node")]
        to_nodes: Vec<String>,
        /// Where to write the marked IR, as JSON.
        #[arg(long)]
        output: PathBuf,
    },
    /// Recycle artifacts from the latest successful run of a pipeline
    /// into a new partial run.
    Recycle {
        /// Path to the pipeline IR, as JSON.
        pipeline_ir: PathBuf,
        /// Run id of the new partial run.
        #[arg(long)]
        pipeline_run_id: String,
        /// Node ids whose outputs should be reused rather than
        /// re-executed (repeatable).
        #[arg(long = "reuse-node", required = true)]
        reuse_nodes: Vec<String>,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
