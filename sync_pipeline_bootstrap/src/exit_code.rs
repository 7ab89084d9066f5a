// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **130/143**: Interrupted/terminated by signal

use std::fmt;

use sync_pipeline_domain::OrchestrationError;

/// Exit codes following Unix conventions (BSD sysexits.h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    UsageError = 64,
    DataError = 65,
    NoInput = 66,
    Unavailable = 69,
    Software = 70,
    OsError = 71,
    IoError = 74,
    TempFail = 75,
    NoPerm = 77,
    Config = 78,
    Interrupted = 130,
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps an [`OrchestrationError`] to the exit code its category
    /// implies: recoverable store errors become `TempFail` (a caller or
    /// supervisor may retry), structural IR problems and marker
    /// tampering become `DataError`/`Software` respectively.
    pub fn from_orchestration_error(error: &OrchestrationError) -> Self {
        if error.is_recoverable() {
            return ExitCode::TempFail;
        }
        match error.category() {
            "ir" => ExitCode::DataError,
            "input_resolution" | "node_execution" | "service_job" => ExitCode::Software,
            "partial_run" => ExitCode::UsageError,
            "lookup" => ExitCode::NoInput,
            "store" => ExitCode::Unavailable,
            _ => ExitCode::Error,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::OsError => "System error",
            ExitCode::IoError => "I/O error",
            ExitCode::TempFail => "Temporary failure, retry",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

/// Maps any orchestration result's error variant to its exit code.
pub fn map_error_to_exit_code(error: &OrchestrationError) -> ExitCode {
    ExitCode::from_orchestration_error(error)
}

/// Converts a top-level application result directly into a process
/// exit code, the last step before `std::process::exit`.
pub fn result_to_exit_code(result: Result<(), OrchestrationError>) -> std::process::ExitCode {
    let code = match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!(category = e.category(), "{e}");
            map_error_to_exit_code(&e)
        }
    };
    std::process::ExitCode::from(code.as_i32() as u8)
}
