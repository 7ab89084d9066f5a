// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline-state port: per-node lifecycle state, tracked between
//! ticks and independent of the metadata store's execution history.
//!
//! A generation tick must hold exclusive access to a pipeline's state
//! for its duration (no two ticks of the same pipeline may interleave
//! their reads and writes). Implementations expose that exclusivity
//! through [`PipelineStateView::acquire`], which hands back an RAII
//! guard; the guard type itself is an infrastructure concern, since it
//! depends on a concrete locking strategy.

use async_trait::async_trait;

use crate::error::OrchestrationError;
use crate::state::NodeState;
use crate::value_objects::{NodeUid, PipelineUid};

/// Read/write access to node lifecycle state for one pipeline.
#[async_trait]
pub trait PipelineStateView: Send + Sync {
    fn pipeline_uid(&self) -> &PipelineUid;

    async fn node_state(&self, node_uid: &NodeUid) -> NodeState;

    async fn set_node_state(&self, node_uid: &NodeUid, state: NodeState);

    /// All node states currently tracked, for snapshotting / debugging.
    async fn all_node_states(&self) -> Vec<(NodeUid, NodeState)>;

    /// Requests that a failed node be retried on the next tick: clears
    /// its terminal `Failed` state back to `Starting`, the one state
    /// step 6 of the generator treats as "a fresh retry is welcome"
    /// rather than re-aborting on the same terminal execution.
    async fn request_retry(&self, node_uid: &NodeUid) -> Result<(), OrchestrationError>;

    /// Marks a node (and, by the caller's choice, its downstream
    /// closure) as stopping, so the generator stops scheduling it
    /// instead of continuing to emit tasks for it.
    async fn request_stop(&self, node_uid: &NodeUid);

    async fn stop_requested(&self, node_uid: &NodeUid) -> bool;
}
