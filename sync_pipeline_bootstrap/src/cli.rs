// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! 1. `parser::parse_cli` parses the raw command line with clap.
//! 2. `validate_cli` runs every argument through `SecureArgParser`.
//! 3. The result is a `ValidatedCli` ready for the engine to consume.

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration: every path canonicalized, every string
/// checked for dangerous patterns.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
}

/// Validated command variants, mirroring `parser::Commands` after
/// security validation.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Tick {
        pipeline_ir: PathBuf,
        pipeline_run_id: Option<String>,
        dry_run: bool,
    },
    MarkPartial {
        pipeline_ir: PathBuf,
        from_nodes: Vec<String>,
        to_nodes: Vec<String>,
        output: PathBuf,
    },
    Recycle {
        pipeline_ir: PathBuf,
        pipeline_run_id: String,
        reuse_nodes: Vec<String>,
    },
}

/// Parses and validates CLI arguments in one step.
///
/// # Errors
///
/// Returns `ParseError` if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    let db = if let Some(ref path) = cli.db {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    let command = match cli.command {
        Commands::Tick {
            pipeline_ir,
            pipeline_run_id,
            dry_run,
        } => {
            let validated_ir = SecureArgParser::validate_path(&pipeline_ir.to_string_lossy())?;
            if let Some(ref run_id) = pipeline_run_id {
                SecureArgParser::validate_argument(run_id)?;
            }
            ValidatedCommand::Tick {
                pipeline_ir: validated_ir,
                pipeline_run_id,
                dry_run,
            }
        }
        Commands::MarkPartial {
            pipeline_ir,
            from_nodes,
            to_nodes,
            output,
        } => {
            let validated_ir = SecureArgParser::validate_path(&pipeline_ir.to_string_lossy())?;
            for node_id in from_nodes.iter().chain(to_nodes.iter()) {
                SecureArgParser::validate_argument(node_id)?;
            }
            SecureArgParser::validate_argument(&output.to_string_lossy())?;

            ValidatedCommand::MarkPartial {
                pipeline_ir: validated_ir,
                from_nodes,
                to_nodes,
                output,
            }
        }
        Commands::Recycle {
            pipeline_ir,
            pipeline_run_id,
            reuse_nodes,
        } => {
            let validated_ir = SecureArgParser::validate_path(&pipeline_ir.to_string_lossy())?;
            SecureArgParser::validate_argument(&pipeline_run_id)?;
            for node_id in &reuse_nodes {
                SecureArgParser::validate_argument(node_id)?;
            }

            ValidatedCommand::Recycle {
                pipeline_ir: validated_ir,
                pipeline_run_id,
                reuse_nodes,
            }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
        db,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dangerous_node_ids() {
        let err = SecureArgParser::validate_argument("../../etc/passwd").unwrap_err();
        assert!(matches!(err, ParseError::DangerousPattern { .. }));
    }
}
