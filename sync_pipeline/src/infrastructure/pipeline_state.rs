// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-memory pipeline-state view: per-node lifecycle state tracked
//! between ticks, guarded by a scoped RAII acquisition so a tick's
//! reads/writes release the lock on every exit path, including early
//! returns and panics.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ports::PipelineStateView;
use sync_pipeline_domain::state::NodeState;
use sync_pipeline_domain::task::Task;
use sync_pipeline_domain::value_objects::{NodeUid, PipelineUid};

/// A scoped handle onto a pipeline's node-state map. Holding one blocks
/// other acquisitions of the same pipeline's state; `Drop` releases it
/// unconditionally.
pub struct PipelineStateScope<'a> {
    pipeline_uid: &'a PipelineUid,
    guard: parking_lot::RwLockWriteGuard<'a, HashMap<NodeUid, NodeState>>,
}

impl<'a> PipelineStateScope<'a> {
    pub fn node_state(&self, node_uid: &NodeUid) -> NodeState {
        self.guard.get(node_uid).cloned().unwrap_or_default()
    }

    pub fn set_node_state(&mut self, node_uid: &NodeUid, state: NodeState) {
        self.guard.insert(node_uid.clone(), state);
    }

    pub fn all_node_states(&self) -> Vec<(NodeUid, NodeState)> {
        self.guard
            .iter()
            .map(|(uid, state)| (uid.clone(), state.clone()))
            .collect()
    }
}

impl Drop for PipelineStateScope<'_> {
    fn drop(&mut self) {
        tracing::trace!(pipeline_uid = %self.pipeline_uid, "released pipeline state scope");
    }
}

/// Production `PipelineStateView`: a `parking_lot::RwLock`-guarded map,
/// one instance per pipeline run. Cloning shares the underlying state -
/// a caller that hands a generator its own clone can still read back
/// whatever the generator's tick applied.
#[derive(Clone)]
pub struct InMemoryPipelineState {
    pipeline_uid: PipelineUid,
    states: Arc<RwLock<HashMap<NodeUid, NodeState>>>,
    stop_requests: Arc<RwLock<HashMap<NodeUid, bool>>>,
}

impl InMemoryPipelineState {
    pub fn new(pipeline_uid: PipelineUid) -> Self {
        Self {
            pipeline_uid,
            states: Arc::new(RwLock::new(HashMap::new())),
            stop_requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Acquires exclusive access to this pipeline's node-state map for
    /// the duration of the returned scope.
    pub fn acquire(&self) -> PipelineStateScope<'_> {
        tracing::trace!(pipeline_uid = %self.pipeline_uid, "acquired pipeline state scope");
        PipelineStateScope {
            pipeline_uid: &self.pipeline_uid,
            guard: self.states.write(),
        }
    }
}

#[async_trait]
impl PipelineStateView for InMemoryPipelineState {
    fn pipeline_uid(&self) -> &PipelineUid {
        &self.pipeline_uid
    }

    async fn node_state(&self, node_uid: &NodeUid) -> NodeState {
        self.acquire().node_state(node_uid)
    }

    async fn set_node_state(&self, node_uid: &NodeUid, state: NodeState) {
        self.acquire().set_node_state(node_uid, state);
    }

    async fn all_node_states(&self) -> Vec<(NodeUid, NodeState)> {
        self.acquire().all_node_states()
    }

    async fn request_retry(&self, node_uid: &NodeUid) -> Result<(), OrchestrationError> {
        let mut scope = self.acquire();
        match scope.node_state(node_uid) {
            NodeState::Failed { .. } => {
                // `Starting`, not `New`: step 6 of the generator only
                // skips a terminal-failed latest execution's abort path
                // when the node's current state is `Starting`, which is
                // exactly the signal a retry request must produce.
                scope.set_node_state(node_uid, NodeState::Starting);
                Ok(())
            }
            other => Err(OrchestrationError::Internal(format!(
                "cannot retry node {node_uid} in state {other:?}: only Failed nodes may be retried"
            ))),
        }
    }

    async fn request_stop(&self, node_uid: &NodeUid) {
        self.stop_requests.write().insert(node_uid.clone(), true);
    }

    async fn stop_requested(&self, node_uid: &NodeUid) -> bool {
        self.stop_requests.read().get(node_uid).copied().unwrap_or(false)
    }
}

/// Applies every `UpdateNodeState` task a tick emitted back onto
/// `pipeline_state`, the external counterpart to the generator's purely
/// decision-making `generate()`: without this, a node's state never
/// actually advances between ticks and the generator keeps re-deciding
/// it from scratch every time.
pub async fn apply_node_state_tasks<P: PipelineStateView>(pipeline_state: &P, tasks: &[Task]) {
    for task in tasks {
        if let Task::UpdateNodeState { node_uid, new_state, .. } = task {
            pipeline_state.set_node_state(node_uid, new_state.clone()).await;
        }
    }
}
