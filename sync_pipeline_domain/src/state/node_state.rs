// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Node state: the orchestrator's view of where a node currently stands,
//! tracked per `(pipeline_uid, node_uid)` across ticks.

use serde::{Deserialize, Serialize};

use crate::value_objects::Status;

/// The lifecycle state of a single node, as tracked by the pipeline
/// state view between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Never scheduled yet.
    New,
    /// A task has been emitted for this node and is awaiting execution.
    Starting,
    /// The node's execution is in progress (relevant for service nodes;
    /// for task nodes this is inferred from the latest execution's
    /// state in the metadata store rather than tracked independently).
    Running,
    /// The node completed successfully on its latest execution.
    Complete,
    /// The node's latest execution ended in a non-retryable failure.
    Failed { status: Status },
    /// The node was intentionally excluded from this run (partial-run
    /// skip, or upstream failure propagation) but did not fail itself.
    Skipped,
    /// A stop was requested for this node; no further tasks will be
    /// generated for it until it's resumed.
    Stopping,
    Stopped,
}

impl NodeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeState::Complete | NodeState::Failed { .. } | NodeState::Skipped | NodeState::Stopped
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NodeState::Complete)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, NodeState::Failed { .. })
    }
}

impl Default for NodeState {
    fn default() -> Self {
        NodeState::New
    }
}
