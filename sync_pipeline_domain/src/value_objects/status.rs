// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Status codes shared by executions, tasks and node states.

use serde::{Deserialize, Serialize};

/// Coarse result code, modeled after the small closed set the original
/// orchestration core uses to classify terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    Cancelled,
    Aborted,
    DeadlineExceeded,
    Unknown,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

/// A code paired with a human-readable message, attached to executions
/// and tasks that report a terminal result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Unknown,
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Cancelled,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}
