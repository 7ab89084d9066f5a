// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The artifact recycler: re-publishes a prior pipeline run's successful
//! executions under a new run's contexts, so a partial run's skipped
//! nodes appear to have already completed without re-executing them.

use std::collections::BTreeSet;

use sync_pipeline_domain::dag::{self, TraverseDirection};
use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ir::{ChiefSettings, PartialRunOption, Pipeline, PipelineNode};
use sync_pipeline_domain::ports::MetadataStoreHandle;
use sync_pipeline_domain::store::{Context, ContextType, Execution, ExecutionState};
use sync_pipeline_domain::value_objects::{ArtifactId, ContextId, PipelineUid};

/// Copies a base run's successful executions forward onto a new run's
/// contexts. One instance per metadata-store connection; cheap to
/// construct since `M` is expected to be a cheaply-cloneable handle
/// (e.g. a connection pool).
pub struct ArtifactRecycler<M> {
    store: M,
}

impl<M> ArtifactRecycler<M>
where
    M: MetadataStoreHandle,
{
    pub fn new(store: M) -> Self {
        Self { store }
    }

    /// Invoked at node runtime by the one node in a marked pipeline
    /// carrying `chief_settings`: recycles every reusable node's
    /// outputs into the current run before that node (or anything
    /// downstream of it) actually executes. A no-op for every other
    /// node.
    pub async fn snapshot(&self, pipeline: &Pipeline, node: &PipelineNode) -> Result<(), OrchestrationError> {
        let PartialRunOption::Run { chief: Some(chief_settings) } = &node.options.partial_run else {
            return Ok(());
        };

        let base_run_id = match chief_settings {
            ChiefSettings::LatestPipelineRun => None,
            ChiefSettings::BasePipelineRun { base_run_id } => Some(base_run_id.clone()),
        };

        self.reuse_pipeline_run_artifacts(pipeline, base_run_id, None).await?;
        Ok(())
    }

    /// Re-publishes every node outside the run subgraph's most recent
    /// successful execution under `new_run_id`'s contexts, as a fresh
    /// `CacheHit` execution carrying the same output artifacts. Returns
    /// the number of executions recycled.
    ///
    /// Idempotent: a second call against the same `(pipeline, base,
    /// new)` finds the already-recycled executions (matched by output
    /// artifact identity) and skips them.
    pub async fn reuse_pipeline_run_artifacts(
        &self,
        pipeline: &Pipeline,
        base_run_id: Option<String>,
        new_run_id: Option<String>,
    ) -> Result<usize, OrchestrationError> {
        let resolved_new_run_id = resolve_new_run_id(pipeline, new_run_id)?;

        let node_upstream = dag::ordered_node_map(pipeline);

        let run_ids: Vec<String> = pipeline
            .nodes()
            .filter(|n| matches!(n.options.partial_run, PartialRunOption::Run { .. }))
            .map(|n| n.node_id.clone())
            .collect();
        let downstream_of_run = dag::traverse(&node_upstream, &run_ids, TraverseDirection::Downstream);

        let skip_included_ids: Vec<String> = pipeline
            .nodes()
            .filter(|n| matches!(n.options.partial_run, PartialRunOption::Skip { reuse_artifacts: true }))
            .map(|n| n.node_id.clone())
            .collect();
        let upstream_of_skip_included = dag::traverse(&node_upstream, &skip_included_ids, TraverseDirection::Upstream);

        if !downstream_of_run.is_disjoint(&upstream_of_skip_included) {
            return Err(OrchestrationError::MarkerTampered(
                "downstream closure of run nodes overlaps upstream closure of reusable skip nodes; \
                 this should never happen for an unmodified mark_pipeline output"
                    .to_string(),
            ));
        }

        let nodes_to_reuse: Vec<String> = pipeline
            .nodes()
            .map(|n| n.node_id.clone())
            .filter(|id| !downstream_of_run.contains(id))
            .collect();

        let pipeline_name = pipeline.uid.pipeline_name();
        let prefix = format!("{pipeline_name}:");
        let new_run_ctx_name = PipelineUid::new(pipeline_name, Some(resolved_new_run_id.clone())).to_string();

        let resolved_base_run_id = match base_run_id {
            Some(id) => id,
            None => {
                let candidates = self.store.list_contexts_by_type(ContextType::PipelineRun).await?;
                candidates
                    .into_iter()
                    .map(|c| c.name)
                    .find(|name| name.starts_with(&prefix) && name != &new_run_ctx_name)
                    .map(|name| name[prefix.len()..].to_string())
                    .ok_or_else(|| {
                        OrchestrationError::BaseRunMissing(format!(
                            "no prior pipeline run exists for pipeline {pipeline_name}; run it in full at least once first"
                        ))
                    })?
            }
        };
        let base_run_ctx_name = PipelineUid::new(pipeline_name, Some(resolved_base_run_id)).to_string();

        let pipeline_ctx = self
            .store
            .get_or_create_context(Context::new(ContextType::Pipeline, pipeline_name))
            .await?;
        let new_run_ctx = self
            .store
            .get_or_create_context(Context::new(ContextType::PipelineRun, &new_run_ctx_name))
            .await?;
        let base_run_ctx = self
            .store
            .get_context(ContextType::PipelineRun, &base_run_ctx_name)
            .await?
            .ok_or_else(|| {
                OrchestrationError::BaseRunMissing(format!(
                    "base run context {base_run_ctx_name} does not exist"
                ))
            })?;

        let pipeline_ctx_id = pipeline_ctx.id.expect("persisted context has an id");
        let new_run_ctx_id = new_run_ctx.id.expect("persisted context has an id");
        let base_run_ctx_id = base_run_ctx.id.expect("persisted context has an id");

        let mut recycled = 0usize;
        for node_id in &nodes_to_reuse {
            let node_uid = pipeline.node_uid(node_id);
            let node_ctx = self
                .store
                .get_or_create_context(Context::new(ContextType::Node, node_uid.to_string()))
                .await?;
            let node_ctx_id = node_ctx.id.expect("persisted context has an id");

            recycled += self
                .recycle_node(pipeline_ctx_id, node_ctx_id, base_run_ctx_id, new_run_ctx_id, node_id)
                .await?;
        }

        self.store.put_parent_context(base_run_ctx_id, new_run_ctx_id).await?;

        Ok(recycled)
    }

    async fn recycle_node(
        &self,
        pipeline_ctx: ContextId,
        node_ctx: ContextId,
        base_run_ctx: ContextId,
        new_run_ctx: ContextId,
        node_id: &str,
    ) -> Result<usize, OrchestrationError> {
        let source_executions = self
            .store
            .get_executions_associated_with_all_contexts(&[pipeline_ctx, node_ctx, base_run_ctx])
            .await?;
        let successful: Vec<_> = source_executions
            .into_iter()
            .filter(|e| e.state.is_successful())
            .collect();
        if successful.is_empty() {
            return Ok(0);
        }

        let existing_in_new_run = self
            .store
            .get_executions_associated_with_all_contexts(&[pipeline_ctx, node_ctx, new_run_ctx])
            .await?;

        let mut recycled = 0usize;
        for source in &successful {
            let source_id = source.id.expect("persisted execution has an id");
            let source_outputs = self.store.output_artifacts_of(source_id).await?;
            let source_artifact_ids: BTreeSet<ArtifactId> =
                source_outputs.iter().filter_map(|(_, a)| a.id).collect();

            if self
                .already_recycled(&existing_in_new_run, &source_artifact_ids)
                .await?
            {
                continue;
            }

            let execution = self
                .store
                .create_execution(
                    Execution::new(node_id, chrono::Utc::now()),
                    &[pipeline_ctx, node_ctx, new_run_ctx],
                )
                .await?;
            let execution_id = execution.id.expect("persisted execution has an id");

            for (channel, artifact) in &source_outputs {
                if let Some(artifact_id) = artifact.id {
                    self.store.record_event(execution_id, artifact_id, channel, false).await?;
                }
            }
            self.store
                .update_execution_state(execution_id, ExecutionState::CacheHit, None)
                .await?;
            recycled += 1;
        }

        Ok(recycled)
    }

    /// A recycle is a duplicate only when a `CacheHit` execution already
    /// in the new run carries the exact same non-empty output artifact
    /// set as the base run's execution being recycled.
    async fn already_recycled(
        &self,
        existing_in_new_run: &[Execution],
        source_artifact_ids: &BTreeSet<ArtifactId>,
    ) -> Result<bool, OrchestrationError> {
        if source_artifact_ids.is_empty() {
            return Ok(false);
        }
        for candidate in existing_in_new_run {
            if candidate.state != ExecutionState::CacheHit {
                continue;
            }
            let candidate_id = candidate.id.expect("persisted execution has an id");
            let candidate_outputs = self.store.output_artifacts_of(candidate_id).await?;
            let candidate_ids: BTreeSet<ArtifactId> =
                candidate_outputs.iter().filter_map(|(_, a)| a.id).collect();
            if &candidate_ids == source_artifact_ids {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Resolves the run id new executions should be attached under: the
/// IR's own `pipeline_run_id` wins when present, falling back to the
/// caller-supplied argument; the two must agree when both are given.
fn resolve_new_run_id(pipeline: &Pipeline, new_run_id: Option<String>) -> Result<String, OrchestrationError> {
    match (pipeline.uid.pipeline_run_id(), new_run_id) {
        (Some(ir_run_id), Some(arg_run_id)) if ir_run_id != arg_run_id => Err(OrchestrationError::Internal(format!(
            "pipeline IR run id {ir_run_id} disagrees with supplied new_run_id {arg_run_id}"
        ))),
        (Some(ir_run_id), _) => Ok(ir_run_id.to_string()),
        (None, Some(arg_run_id)) => Ok(arg_run_id),
        (None, None) => Err(OrchestrationError::Internal(
            "no new pipeline run id: neither the pipeline IR nor the caller supplied one".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::metadata_store::{schema, SqliteMetadataStore};
    use sqlx::SqlitePool;
    use sync_pipeline_domain::ir::{
        ChiefSettings, DeploymentConfig, ExecutionMode, InputCardinality, InputChannel, InputSpec,
        NodeExecutionOptions, NodeInputs,
    };
    use sync_pipeline_domain::store::Artifact;
    use sync_pipeline_domain::value_objects::NodeUid;

    async fn store() -> SqliteMetadataStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        SqliteMetadataStore::new(pool)
    }

    fn node(id: &str, upstream: Option<&str>) -> PipelineNode {
        let mut inputs = NodeInputs::new();
        if let Some(upstream) = upstream {
            inputs.insert(
                "in",
                InputSpec {
                    channel: InputChannel::Upstream {
                        producer_node: NodeUid::new("p", upstream),
                        output_key: "out".to_string(),
                    },
                    cardinality: InputCardinality::List,
                    optional: false,
                },
            );
        }
        PipelineNode::new(id, inputs, NodeExecutionOptions::default())
    }

    fn marked_pipeline(run_id: &str) -> Pipeline {
        let mut pipeline = Pipeline::new(
            sync_pipeline_domain::value_objects::PipelineUid::new("p", Some(run_id.to_string())),
            ExecutionMode::Sync,
            false,
            DeploymentConfig::default(),
            vec![node("A", None), node("B", Some("A")), node("C", Some("B"))],
        )
        .unwrap();
        crate::application::partial_run_marker::mark_pipeline(
            &mut pipeline,
            |id| id == "B",
            |id| id == "C",
            ChiefSettings::LatestPipelineRun,
        )
        .unwrap();
        pipeline
    }

    async fn seed_base_run_a_success(store: &SqliteMetadataStore) -> sync_pipeline_domain::value_objects::ArtifactId {
        let pipeline_ctx = store
            .get_or_create_context(Context::new(ContextType::Pipeline, "p"))
            .await
            .unwrap();
        let base_run_ctx = store
            .get_or_create_context(Context::new(ContextType::PipelineRun, "p:run-1"))
            .await
            .unwrap();
        let node_ctx = store
            .get_or_create_context(Context::new(ContextType::Node, "p.A"))
            .await
            .unwrap();

        let execution = store
            .create_execution(
                Execution::new("A", chrono::Utc::now()),
                &[pipeline_ctx.id.unwrap(), base_run_ctx.id.unwrap(), node_ctx.id.unwrap()],
            )
            .await
            .unwrap();
        let artifact = store
            .create_artifact(Artifact::new("Examples", "/tmp/examples"))
            .await
            .unwrap();
        store
            .record_event(execution.id.unwrap(), artifact.id.unwrap(), "out", false)
            .await
            .unwrap();
        store
            .update_execution_state(execution.id.unwrap(), ExecutionState::Complete, None)
            .await
            .unwrap();
        artifact.id.unwrap()
    }

    #[tokio::test]
    async fn recycles_skipped_node_output_under_new_run() {
        let store = store().await;
        seed_base_run_a_success(&store).await;

        let pipeline = marked_pipeline("run-2");
        let recycler = ArtifactRecycler::new(store.clone());
        let recycled = recycler
            .reuse_pipeline_run_artifacts(&pipeline, None, None)
            .await
            .unwrap();
        assert_eq!(recycled, 1);

        let node_ctx = store.get_context(ContextType::Node, "p.A").await.unwrap().unwrap();
        let new_run_ctx = store
            .get_context(ContextType::PipelineRun, "p:run-2")
            .await
            .unwrap()
            .unwrap();
        let pipeline_ctx = store.get_context(ContextType::Pipeline, "p").await.unwrap().unwrap();

        let executions = store
            .get_executions_associated_with_all_contexts(&[
                pipeline_ctx.id.unwrap(),
                node_ctx.id.unwrap(),
                new_run_ctx.id.unwrap(),
            ])
            .await
            .unwrap();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].state, ExecutionState::CacheHit);
    }

    #[tokio::test]
    async fn second_call_is_idempotent() {
        let store = store().await;
        seed_base_run_a_success(&store).await;

        let pipeline = marked_pipeline("run-2");
        let recycler = ArtifactRecycler::new(store.clone());
        recycler.reuse_pipeline_run_artifacts(&pipeline, None, None).await.unwrap();
        let second = recycler.reuse_pipeline_run_artifacts(&pipeline, None, None).await.unwrap();
        assert_eq!(second, 0);

        let node_ctx = store.get_context(ContextType::Node, "p.A").await.unwrap().unwrap();
        let new_run_ctx = store
            .get_context(ContextType::PipelineRun, "p:run-2")
            .await
            .unwrap()
            .unwrap();
        let pipeline_ctx = store.get_context(ContextType::Pipeline, "p").await.unwrap().unwrap();
        let executions = store
            .get_executions_associated_with_all_contexts(&[
                pipeline_ctx.id.unwrap(),
                node_ctx.id.unwrap(),
                new_run_ctx.id.unwrap(),
            ])
            .await
            .unwrap();
        assert_eq!(executions.len(), 1);
    }

    #[tokio::test]
    async fn missing_base_run_fails_clearly() {
        let store = store().await;
        let pipeline = marked_pipeline("run-2");
        let recycler = ArtifactRecycler::new(store);
        let err = recycler
            .reuse_pipeline_run_artifacts(&pipeline, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::BaseRunMissing(_)));
    }

    #[tokio::test]
    async fn put_parent_context_links_base_to_new_run() {
        let store = store().await;
        seed_base_run_a_success(&store).await;
        let pipeline = marked_pipeline("run-2");
        let recycler = ArtifactRecycler::new(store.clone());
        recycler.reuse_pipeline_run_artifacts(&pipeline, None, None).await.unwrap();

        let new_run_ctx = store
            .get_context(ContextType::PipelineRun, "p:run-2")
            .await
            .unwrap()
            .unwrap();
        let parents = store.parent_contexts(new_run_ctx.id.unwrap()).await.unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].name, "p:run-1");
    }
}
