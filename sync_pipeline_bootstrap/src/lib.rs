// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the engine's application,
//! infrastructure and domain layers and provides:
//!
//! - **Entry point** - CLI parsing and validation
//! - **Signal handling** - Graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Configuration** - `AppConfig`, the validated settings struct
//! - **Exit codes** - Mapping orchestration errors to Unix exit codes
//! - **Logging** - A minimal bootstrap-phase logging abstraction
//! - **Shutdown coordination** - Cancellation tokens and grace periods
//!
//! ## Key design principles
//!
//! 1. Bootstrap can access the engine and domain crates; neither can
//!    depend back on bootstrap.
//! 2. Security first: all CLI arguments pass through `SecureArgParser`.
//! 3. Every component sits behind a trait, with a no-op implementation
//!    available for testing.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Bootstraps and parses CLI arguments.
///
/// This is the main entry point for the bootstrap layer. The caller is
/// responsible for running the application logic and mapping its result
/// to an exit code with [`result_to_exit_code`].
///
/// # Errors
///
/// Returns [`cli::ParseError`] if CLI parsing or validation fails. Clap
/// handles `--help`/`--version` itself and exits the process directly.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
