// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The metadata store port: everything the orchestration core needs
//! from an MLMD-like store, expressed as a trait so the domain never
//! depends on a concrete database.

use async_trait::async_trait;

use crate::error::OrchestrationError;
use crate::store::{Artifact, Context, ContextType, Execution, ExecutionState};
use crate::value_objects::{ArtifactId, ContextId, ExecutionId};

/// Read/write access to the contexts, executions and artifacts backing
/// a pipeline's run history. Implementations are expected to be
/// transactionally consistent for the multi-step operations used by the
/// artifact recycler (`cache_and_publish`, `put_parent_context`).
#[async_trait]
pub trait MetadataStoreHandle: Send + Sync {
    /// Fetches a context by type and name, creating it (with the given
    /// properties) if it doesn't exist. Idempotent under concurrent
    /// callers: two callers racing to create the same context both
    /// observe the same resulting row.
    async fn get_or_create_context(
        &self,
        context: Context,
    ) -> Result<Context, OrchestrationError>;

    async fn get_context(
        &self,
        context_type: ContextType,
        name: &str,
    ) -> Result<Option<Context>, OrchestrationError>;

    /// Associates a child context with a parent context (e.g. a node
    /// context with its pipeline-run context), so traversal from one
    /// reaches the other.
    async fn put_parent_context(
        &self,
        parent: ContextId,
        child: ContextId,
    ) -> Result<(), OrchestrationError>;

    async fn parent_contexts(&self, child: ContextId) -> Result<Vec<Context>, OrchestrationError>;

    async fn create_execution(
        &self,
        execution: Execution,
        contexts: &[ContextId],
    ) -> Result<Execution, OrchestrationError>;

    async fn update_execution_state(
        &self,
        execution_id: ExecutionId,
        state: ExecutionState,
        error_message: Option<String>,
    ) -> Result<(), OrchestrationError>;

    async fn get_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<Execution>, OrchestrationError>;

    /// All executions recorded against a node context, newest first.
    async fn get_executions_for_context(
        &self,
        context_id: ContextId,
    ) -> Result<Vec<Execution>, OrchestrationError>;

    async fn create_artifact(&self, artifact: Artifact) -> Result<Artifact, OrchestrationError>;

    async fn get_artifacts_by_ids(
        &self,
        ids: &[ArtifactId],
    ) -> Result<Vec<Artifact>, OrchestrationError>;

    /// Links an execution to the artifacts it consumed (input events)
    /// or produced (output events), keyed by channel name.
    async fn record_event(
        &self,
        execution_id: ExecutionId,
        artifact_id: ArtifactId,
        channel_name: &str,
        is_input: bool,
    ) -> Result<(), OrchestrationError>;

    /// Output artifacts of a given execution, grouped by the channel
    /// name they were recorded under.
    async fn output_artifacts_of(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<(String, Artifact)>, OrchestrationError>;

    /// Input artifacts of a given execution, grouped by the channel name
    /// they were recorded under. Used to rebuild a node's resolved
    /// inputs from an execution that is still in flight, without
    /// re-running input resolution against current (possibly since
    /// changed) upstream state.
    async fn input_artifacts_of(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<(String, Artifact)>, OrchestrationError>;

    /// All contexts of a given type, newest first. Used to find the most
    /// recent pipeline-run context when a base run isn't named
    /// explicitly.
    async fn list_contexts_by_type(
        &self,
        context_type: ContextType,
    ) -> Result<Vec<Context>, OrchestrationError>;

    /// Executions associated with every context in `contexts` at once
    /// (e.g. a node context, its pipeline context and a specific
    /// pipeline-run context together), newest first. An execution must
    /// be linked to all of them, not merely one, to be returned.
    async fn get_executions_associated_with_all_contexts(
        &self,
        contexts: &[ContextId],
    ) -> Result<Vec<Execution>, OrchestrationError>;
}
