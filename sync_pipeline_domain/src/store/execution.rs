// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Execution records: one per attempt at running a node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ExecutionId, Status};

/// Property key under which a failed execution's error message is
/// stored, matching the key the original core reserves for this
/// purpose so that downstream tooling reading the store directly keeps
/// working.
pub const EXECUTION_ERROR_MSG_KEY: &str = "__execution_error_msg__";

/// The state of an execution, independent of the node-level `NodeState`
/// (an execution is a single attempt; a node may have many over its
/// lifetime across retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    New,
    Running,
    Complete,
    Failed,
    Cancelled,
    CacheHit,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Complete
                | ExecutionState::Failed
                | ExecutionState::Cancelled
                | ExecutionState::CacheHit
        )
    }

    pub fn is_successful(self) -> bool {
        matches!(self, ExecutionState::Complete | ExecutionState::CacheHit)
    }
}

/// A single attempt at executing a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Option<ExecutionId>,
    pub node_id: String,
    pub state: ExecutionState,
    pub create_time: DateTime<Utc>,
    pub last_known_state_time: DateTime<Utc>,
    pub status: Option<Status>,
}

impl Execution {
    pub fn new(node_id: impl Into<String>, create_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            node_id: node_id.into(),
            state: ExecutionState::New,
            create_time,
            last_known_state_time: create_time,
            status: None,
        }
    }

    /// The error message recorded for a failed execution, if any, under
    /// the reserved property key.
    pub fn error_message(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.message.as_str())
    }
}
