// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Tasks: the unit of work a tick of the generator hands back to its
//! caller. A tick never executes a node itself - it only decides what
//! should happen next and encodes that decision as zero or more tasks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::NodeState;
use crate::store::Artifact;
use crate::value_objects::{ContextId, ExecutionId, NodeUid, PipelineUid, Status, TaskId};

/// A fully resolved input, ready to hand to an executor: the channel
/// name plus the concrete artifacts bound to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedInput {
    pub name: String,
    pub artifacts: Vec<Artifact>,
}

/// An output an executor is expected to produce: the channel name plus
/// the (unpersisted) artifact descriptor an executor should materialize
/// at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedOutput {
    pub name: String,
    pub artifact: Artifact,
}

/// One unit of orchestrator-decided work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Task {
    /// Execute a node: inputs were resolved successfully and the node
    /// either has no valid cache entry or caching is disabled.
    ExecuteNode {
        node_uid: NodeUid,
        execution_id: ExecutionId,
        /// The pipeline (and run) this execution belongs to, so a
        /// caller handling the task in isolation doesn't need to thread
        /// it through separately.
        pipeline_ref: PipelineUid,
        /// The pipeline, pipeline-run and node contexts this execution
        /// is associated with in the metadata store.
        contexts: Vec<ContextId>,
        inputs: Vec<ResolvedInput>,
        exec_properties: BTreeMap<String, serde_json::Value>,
        output_artifacts: Vec<ResolvedOutput>,
        executor_output_uri: String,
        stateful_working_dir: String,
    },
    /// A node's inputs resolved and a matching cache entry was found;
    /// no execution needed, just publish the cached outputs.
    CacheHit {
        node_uid: NodeUid,
        execution_id: ExecutionId,
        source_execution_id: ExecutionId,
    },
    /// Start (or ensure running) a service job for a pure/mixed service
    /// node.
    StartServiceJob { node_uid: NodeUid },
    /// Cancel a node's current execution, e.g. in response to an
    /// upstream failure or an explicit stop request.
    CancelNode { node_uid: NodeUid, status: Status },
    /// Update the node's recorded state without any external side
    /// effect (e.g. transition to `Complete` after a cache hit task
    /// completed its bookkeeping, or to `Failed` when input resolution
    /// or execution itself failed).
    UpdateNodeState {
        node_uid: NodeUid,
        new_state: NodeState,
        status: Option<Status>,
    },
    /// Emit a final pipeline-level status when the finalize node (or, in
    /// its absence, all terminal nodes) has reached a terminal state.
    FinalizePipeline { status: Status },
}

impl Task {
    pub fn node_uid(&self) -> Option<&NodeUid> {
        match self {
            Task::ExecuteNode { node_uid, .. }
            | Task::CacheHit { node_uid, .. }
            | Task::StartServiceJob { node_uid }
            | Task::CancelNode { node_uid, .. }
            | Task::UpdateNodeState { node_uid, .. } => Some(node_uid),
            Task::FinalizePipeline { .. } => None,
        }
    }
}

/// The task id an `ExecuteNode` task is tracked under: deterministic in
/// the node, so a caller's `TaskTracker` and the generator always agree
/// on which task a given node's in-flight execution belongs to.
pub fn exec_task_id(node_uid: &NodeUid) -> TaskId {
    TaskId::new(format!("exec_node_task:{node_uid}"))
}
