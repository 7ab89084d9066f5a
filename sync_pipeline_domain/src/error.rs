// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! Hierarchical error type for the orchestration domain. Each variant
//! corresponds to one row of the error taxonomy: IR validation failures
//! fail fast at construction time, while per-node failures (input
//! resolution, node execution, service jobs) are surfaced as tasks by the
//! task generator rather than as `Err` from `generate()`. Only the
//! partial-run and recycler paths propagate these variants directly to
//! their callers.

use thiserror::Error;

/// Domain-specific errors for the orchestration system.
#[derive(Error, Debug, Clone)]
pub enum OrchestrationError {
    /// The pipeline IR itself is invalid: wrong execution mode, a
    /// sub-pipeline node, a node graph that isn't a DAG, or an IR that
    /// isn't topologically sorted.
    #[error("invalid pipeline IR: {0}")]
    IrInvalid(String),

    /// Input resolution for a node returned an error rather than an empty
    /// result. An empty result (no valid input tuples) is not an error -
    /// the node is skipped instead.
    #[error("input resolution failed for node {node_uid}: {message}")]
    InputResolutionFailed { node_uid: String, message: String },

    /// A node's latest execution is terminal-non-successful and the node
    /// is not in `STARTING`.
    #[error("node execution failed: {node_uid}: {message}")]
    NodeExecutionFailed { node_uid: String, message: String },

    /// The service-job manager reported `FAILED` for a pure or mixed
    /// service node.
    #[error("service job failed: {node_uid}: {message}")]
    ServiceJobFailed { node_uid: String, message: String },

    /// No previous pipeline run exists to use as a partial-run base.
    #[error("partial-run base run missing: {0}")]
    BaseRunMissing(String),

    /// The marker's output was tampered with: the downstream-closure of
    /// `run` nodes overlaps the upstream-closure of skipped-but-included
    /// nodes. This should never happen if `mark_pipeline`'s output is
    /// passed through unmodified.
    #[error("marker output tampered: {0}")]
    MarkerTampered(String),

    /// A lookup in the metadata store (context, execution, node) came back
    /// empty when the caller required it to exist.
    #[error("not found in metadata store: {0}")]
    NotFound(String),

    /// The metadata store adapter itself failed (connection, query,
    /// migration).
    #[error("metadata store error: {0}")]
    Store(String),

    /// Any other unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestrationError {
    /// Whether retrying the same operation might succeed without any
    /// change in caller behavior (transient store/connectivity issues).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, OrchestrationError::Store(_))
    }

    /// Coarse category, useful for metrics labels and log fields.
    pub fn category(&self) -> &'static str {
        match self {
            OrchestrationError::IrInvalid(_) => "ir",
            OrchestrationError::InputResolutionFailed { .. } => "input_resolution",
            OrchestrationError::NodeExecutionFailed { .. } => "node_execution",
            OrchestrationError::ServiceJobFailed { .. } => "service_job",
            OrchestrationError::BaseRunMissing(_) => "partial_run",
            OrchestrationError::MarkerTampered(_) => "partial_run",
            OrchestrationError::NotFound(_) => "lookup",
            OrchestrationError::Store(_) => "store",
            OrchestrationError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_recoverable() {
        assert!(OrchestrationError::Store("timeout".into()).is_recoverable());
        assert!(!OrchestrationError::IrInvalid("bad".into()).is_recoverable());
    }

    #[test]
    fn categories_are_stable() {
        assert_eq!(OrchestrationError::IrInvalid("x".into()).category(), "ir");
        assert_eq!(
            OrchestrationError::MarkerTampered("x".into()).category(),
            "partial_run"
        );
    }
}
