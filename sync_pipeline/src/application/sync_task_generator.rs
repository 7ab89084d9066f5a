// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The sync task generator: the scheduling brain. One call to
//! [`SyncPipelineTaskGenerator::generate`] walks a pipeline's nodes in
//! topological layers and decides, per node, exactly one of: nothing
//! (not ready yet), a state update, an execution task, or a service-job
//! check - folding newly successful nodes into the next layer's
//! readiness check as it goes.
//!
//! Not thread-safe: the caller must serialize ticks per pipeline run.
//! Concurrent `generate()` calls against the same metadata store and
//! pipeline race on execution registration.

use std::collections::HashSet;

use indexmap::IndexMap;
use sync_pipeline_domain::cache::compute_fingerprint;
use sync_pipeline_domain::dag;
use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ir::{Pipeline, PipelineNode};
use sync_pipeline_domain::ports::{
    CacheEngine, InputResolver, MetadataStoreHandle, PipelineStateView, ResolutionResult, ServiceJobManager,
    ServiceStatus, SuccessfulNodesCache, TaskTracker,
};
use sync_pipeline_domain::state::NodeState;
use sync_pipeline_domain::store::{Artifact, Context, ContextType, Execution, ExecutionState};
use sync_pipeline_domain::task::{exec_task_id, ResolvedInput, ResolvedOutput, Task};
use sync_pipeline_domain::value_objects::{ContextId, ExecutionId, NodeUid, Status};

/// The pipeline and pipeline-run contexts every node execution in this
/// run is attached to, fetched once per tick.
struct RunContexts {
    pipeline: ContextId,
    pipeline_run: ContextId,
}

/// Accumulates one tick's outcome as nodes are decided, layer by layer.
struct Tick {
    successful_node_ids: HashSet<String>,
    update_tasks: Vec<Task>,
    exec_tasks: Vec<Task>,
    finalize: Option<Status>,
    /// Nodes that finished this layer with a durable execution backing
    /// their success, eligible to be folded into the successful-nodes
    /// cache once the layer completes.
    layer_cacheable: Vec<(String, ExecutionId)>,
}

impl Tick {
    fn new() -> Self {
        Self {
            successful_node_ids: HashSet::new(),
            update_tasks: Vec::new(),
            exec_tasks: Vec::new(),
            finalize: None,
            layer_cacheable: Vec::new(),
        }
    }
}

/// Groups `(channel_name, artifact)` pairs back into [`ResolvedInput`]s,
/// preserving first-seen channel order. Used to rebuild a node's inputs
/// from an in-flight execution without re-running resolution.
fn group_by_channel(pairs: Vec<(String, Artifact)>) -> Vec<ResolvedInput> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: IndexMap<String, Vec<Artifact>> = IndexMap::new();
    for (name, artifact) in pairs {
        if !grouped.contains_key(&name) {
            order.push(name.clone());
        }
        grouped.entry(name).or_default().push(artifact);
    }
    order
        .into_iter()
        .map(|name| ResolvedInput {
            artifacts: grouped.swap_remove(&name).unwrap_or_default(),
            name,
        })
        .collect()
}

/// Composes the six domain ports into the scheduling algorithm of
/// `sync_pipeline_task_gen.py`: one instance per pipeline run.
pub struct SyncPipelineTaskGenerator<M, P, S, C, R, N, T> {
    store: M,
    pipeline_state: P,
    service_jobs: S,
    cache_engine: C,
    input_resolver: R,
    successful_nodes_cache: N,
    task_tracker: T,
    pipeline: Pipeline,
}

impl<M, P, S, C, R, N, T> SyncPipelineTaskGenerator<M, P, S, C, R, N, T>
where
    M: MetadataStoreHandle,
    P: PipelineStateView,
    S: ServiceJobManager,
    C: CacheEngine,
    R: InputResolver,
    N: SuccessfulNodesCache,
    T: TaskTracker,
{
    /// Validates the pipeline IR (sync mode, non-empty, topologically
    /// sorted) before accepting it, matching the constructor-time
    /// fail-fast the original core performs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: M,
        pipeline_state: P,
        service_jobs: S,
        cache_engine: C,
        input_resolver: R,
        successful_nodes_cache: N,
        task_tracker: T,
        pipeline: Pipeline,
    ) -> Result<Self, OrchestrationError> {
        pipeline.validate()?;
        Ok(Self {
            store,
            pipeline_state,
            service_jobs,
            cache_engine,
            input_resolver,
            successful_nodes_cache,
            task_tracker,
            pipeline,
        })
    }

    fn run_id(&self) -> String {
        self.pipeline
            .uid
            .pipeline_run_id()
            .unwrap_or(self.pipeline.uid.pipeline_name())
            .to_string()
    }

    async fn ensure_run_contexts(&self) -> Result<RunContexts, OrchestrationError> {
        let pipeline_ctx = self
            .store
            .get_or_create_context(Context::new(ContextType::Pipeline, self.pipeline.uid.pipeline_name()))
            .await?;
        let run_ctx = self
            .store
            .get_or_create_context(Context::new(ContextType::PipelineRun, self.pipeline.uid.to_string()))
            .await?;
        Ok(RunContexts {
            pipeline: pipeline_ctx.id.expect("persisted context has an id"),
            pipeline_run: run_ctx.id.expect("persisted context has an id"),
        })
    }

    async fn ensure_node_context(&self, node_uid: &NodeUid) -> Result<Context, OrchestrationError> {
        self.store
            .get_or_create_context(Context::new(ContextType::Node, node_uid.to_string()))
            .await
    }

    /// The directory an execution's outputs, executor output proto and
    /// stateful working state live under, namespaced by pipeline, node
    /// and execution so retries and re-runs never collide.
    fn execution_base_dir(&self, node_id: &str, execution_id: ExecutionId) -> String {
        format!("{}/{node_id}/{execution_id}", self.pipeline.uid.pipeline_name())
    }

    /// Materializes a node's declared output channels into artifact
    /// descriptors an executor should produce at, one per channel.
    fn generate_output_artifacts(&self, node: &PipelineNode, node_id: &str, execution_id: ExecutionId) -> Vec<ResolvedOutput> {
        let base = self.execution_base_dir(node_id, execution_id);
        node.outputs
            .iter()
            .map(|(name, spec)| ResolvedOutput {
                name: name.to_string(),
                artifact: Artifact::new(spec.type_name.clone(), format!("{base}/{name}")),
            })
            .collect()
    }

    /// One tick: walk the pipeline's nodes in topological layers,
    /// deciding exactly one outcome per node, and fold the layer's
    /// newly successful nodes into readiness for the next layer.
    pub async fn generate(&self) -> Result<Vec<Task>, OrchestrationError> {
        let node_upstream = dag::ordered_node_map(&self.pipeline);
        let layers = dag::topsorted_layers(&node_upstream);
        let terminals: HashSet<String> = dag::terminal_node_ids(&node_upstream).into_iter().collect();
        let run_id = self.run_id();
        let contexts = self.ensure_run_contexts().await?;

        let mut tick = Tick::new();

        'layers: for layer in &layers {
            for node_id in layer {
                if tick.finalize.is_some() {
                    break 'layers;
                }
                self.decide_node(node_id, &node_upstream, &run_id, &contexts, &mut tick)
                    .await?;
            }

            for node_id in layer {
                if let Some(pos) = tick.layer_cacheable.iter().position(|(id, _)| id == node_id) {
                    let (_, execution_id) = tick.layer_cacheable.remove(pos);
                    self.successful_nodes_cache
                        .record_success(&run_id, self.pipeline.node_uid(node_id), execution_id);
                }
            }

            if tick.finalize.is_some() {
                break;
            }
        }

        if let Some(status) = tick.finalize {
            tick.update_tasks.push(Task::FinalizePipeline { status });
            return Ok(tick.update_tasks);
        }
        if terminals.iter().all(|t| tick.successful_node_ids.contains(t)) {
            tick.update_tasks.push(Task::FinalizePipeline { status: Status::ok() });
            return Ok(tick.update_tasks);
        }
        tick.update_tasks.extend(tick.exec_tasks);
        Ok(tick.update_tasks)
    }

    /// The per-node decision cascade (first match wins): known
    /// successful, upstream not ready, stopping/stopped, pure service,
    /// already in flight, latest execution wins, fresh resolution.
    async fn decide_node(
        &self,
        node_id: &str,
        node_upstream: &IndexMap<String, Vec<String>>,
        run_id: &str,
        contexts: &RunContexts,
        tick: &mut Tick,
    ) -> Result<(), OrchestrationError> {
        let node = self
            .pipeline
            .node(node_id)
            .expect("layered node id always exists in the pipeline it was derived from");
        let node_uid = self.pipeline.node_uid(node_id);

        // 1. Known successful.
        if self.successful_nodes_cache.get(run_id, &node_uid).is_some() {
            tick.successful_node_ids.insert(node_id.to_string());
            return Ok(());
        }

        // 2. Upstream not ready.
        let upstream_ready = node_upstream
            .get(node_id)
            .map(|upstream| upstream.iter().all(|u| tick.successful_node_ids.contains(u)))
            .unwrap_or(true);
        if !upstream_ready {
            return Ok(());
        }

        // 3. Stopping / stopped: emit nothing, just log.
        let state = self.pipeline_state.node_state(&node_uid).await;
        if matches!(state, NodeState::Stopping | NodeState::Stopped) {
            tracing::debug!(%node_uid, ?state, "node stopping/stopped, no further scheduling this tick");
            return Ok(());
        }

        // 4. Pure service node.
        if self.service_jobs.is_pure_service_node(&node_uid) {
            self.service_jobs.ensure_started(&node_uid).await?;
            match self.service_jobs.status(&node_uid).await? {
                ServiceStatus::Failed => self.fail_and_abort(&node_uid, "service job failed", tick),
                ServiceStatus::Succeeded => {
                    tick.update_tasks.push(Task::UpdateNodeState {
                        node_uid: node_uid.clone(),
                        new_state: NodeState::Complete,
                        status: None,
                    });
                    tick.successful_node_ids.insert(node_id.to_string());
                }
                ServiceStatus::Running | ServiceStatus::Pending | ServiceStatus::NotStarted => {
                    tick.update_tasks.push(Task::UpdateNodeState {
                        node_uid: node_uid.clone(),
                        new_state: NodeState::Running,
                        status: None,
                    });
                }
            }
            return Ok(());
        }

        // 5. Already in the task queue: the authoritative signal is the
        // caller's own queue, not this process's local node state, which
        // may not have caught up with it yet (or, after a retry request,
        // may say `Starting` for a node the queue no longer has in
        // flight at all).
        if self.task_tracker.is_task_id_tracked(&exec_task_id(&node_uid)) {
            if self.service_jobs.is_mixed_service_node(&node_uid)
                && self.service_jobs.status(&node_uid).await? == ServiceStatus::Failed
            {
                self.fail_and_abort(&node_uid, "mixed service job failed", tick);
            }
            return Ok(());
        }

        // 6. Latest execution wins.
        let node_ctx = self.ensure_node_context(&node_uid).await?;
        let executions = self
            .store
            .get_executions_for_context(node_ctx.id.expect("persisted context has an id"))
            .await?;
        if let Some(latest) = executions.first() {
            if latest.state.is_successful() {
                tick.update_tasks.push(Task::UpdateNodeState {
                    node_uid: node_uid.clone(),
                    new_state: NodeState::Complete,
                    status: None,
                });
                tick.successful_node_ids.insert(node_id.to_string());
                if let Some(execution_id) = latest.id {
                    tick.layer_cacheable.push((node_id.to_string(), execution_id));
                }
                return Ok(());
            }
            if latest.state.is_terminal() && state != NodeState::Starting {
                let message = latest
                    .error_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node {node_uid} execution ended in state {:?}", latest.state));
                self.fail_and_abort(&node_uid, &message, tick);
                return Ok(());
            }
            if !latest.state.is_terminal() {
                let execution_id = latest.id.expect("persisted execution has an id");
                let pairs = self.store.input_artifacts_of(execution_id).await?;
                tick.update_tasks.push(Task::UpdateNodeState {
                    node_uid: node_uid.clone(),
                    new_state: NodeState::Running,
                    status: None,
                });
                tick.exec_tasks.push(Task::ExecuteNode {
                    node_uid: node_uid.clone(),
                    execution_id,
                    pipeline_ref: self.pipeline.uid.clone(),
                    contexts: vec![contexts.pipeline, contexts.pipeline_run, node_ctx.id.expect("persisted context has an id")],
                    inputs: group_by_channel(pairs),
                    exec_properties: node.parameters.clone(),
                    output_artifacts: self.generate_output_artifacts(node, node_id, execution_id),
                    executor_output_uri: format!("{}/executor_output.pb", self.execution_base_dir(node_id, execution_id)),
                    stateful_working_dir: format!("{}/stateful", self.execution_base_dir(node_id, execution_id)),
                });
                return Ok(());
            }
        }

        // 7. Fresh resolution.
        self.resolve_and_emit(&node_uid, node, node_id, contexts, &node_ctx, tick).await
    }

    fn fail_and_abort(&self, node_uid: &NodeUid, message: &str, tick: &mut Tick) {
        let status = Status::failed(message.to_string());
        tick.update_tasks.push(Task::UpdateNodeState {
            node_uid: node_uid.clone(),
            new_state: NodeState::Failed { status: status.clone() },
            status: Some(status),
        });
        tick.finalize = Some(Status::failed(format!("pipeline aborted: {node_uid} failed: {message}")));
    }

    async fn resolve_and_emit(
        &self,
        node_uid: &NodeUid,
        node: &PipelineNode,
        node_id: &str,
        contexts: &RunContexts,
        node_ctx: &Context,
        tick: &mut Tick,
    ) -> Result<(), OrchestrationError> {
        let resolved = match self.input_resolver.resolve(&node.inputs).await? {
            ResolutionResult::Resolved(resolved) => resolved,
            ResolutionResult::NotReady { missing_channel } => {
                tracing::debug!(%node_uid, missing_channel, "no valid inputs this tick, marking skipped");
                tick.update_tasks.push(Task::UpdateNodeState {
                    node_uid: node_uid.clone(),
                    new_state: NodeState::Skipped,
                    status: None,
                });
                tick.successful_node_ids.insert(node_id.to_string());
                return Ok(());
            }
            ResolutionResult::Error { missing_channel, message } => {
                tracing::warn!(%node_uid, missing_channel, message, "input resolution failed, aborting pipeline");
                self.fail_and_abort(&node_uid, &message, tick);
                return Ok(());
            }
        };

        let node_ctx_id = node_ctx.id.expect("persisted context has an id");
        let execution = self
            .store
            .create_execution(
                Execution::new(node_id, chrono::Utc::now()),
                &[contexts.pipeline, contexts.pipeline_run, node_ctx_id],
            )
            .await?;
        let execution_id = execution.id.expect("persisted execution has an id");

        for input in &resolved {
            for artifact in &input.artifacts {
                if let Some(artifact_id) = artifact.id {
                    self.store
                        .record_event(execution_id, artifact_id, &input.name, true)
                        .await?;
                }
            }
        }

        let executor_spec = self
            .pipeline
            .deployment_config
            .executor_specs
            .get(node_id)
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        if node.caching_enabled(self.pipeline.default_caching_enabled) {
            let input_pairs: Vec<(String, Vec<Artifact>)> =
                resolved.iter().map(|r| (r.name.clone(), r.artifacts.clone())).collect();
            let fingerprint = compute_fingerprint(node_uid, &input_pairs, &executor_spec);

            if let Some(source_execution_id) = self.cache_engine.lookup(&fingerprint).await? {
                let reusable = matches!(
                    self.store.get_execution(source_execution_id).await?,
                    Some(source) if source.state.is_successful()
                );
                if reusable {
                    let outputs = self.store.output_artifacts_of(source_execution_id).await?;
                    for (channel, artifact) in outputs {
                        if let Some(artifact_id) = artifact.id {
                            self.store.record_event(execution_id, artifact_id, &channel, false).await?;
                        }
                    }
                    self.store
                        .update_execution_state(execution_id, ExecutionState::CacheHit, None)
                        .await?;
                    tick.update_tasks.push(Task::UpdateNodeState {
                        node_uid: node_uid.clone(),
                        new_state: NodeState::Complete,
                        status: None,
                    });
                    tick.successful_node_ids.insert(node_id.to_string());
                    tick.layer_cacheable.push((node_id.to_string(), execution_id));
                    return Ok(());
                }
            }
            // Cache miss (or a stale record pointing at a failed
            // execution): record this execution as the fingerprint's
            // new candidate. Lookups re-validate success, so recording
            // before this execution finishes is safe - a lookup that
            // lands on it before it completes simply treats it as a
            // miss and falls through to a fresh execution.
            self.cache_engine.record(fingerprint, execution_id).await?;
        }

        if node.options.is_mixed_service_node {
            self.service_jobs.ensure_started(node_uid).await?;
            if self.service_jobs.status(node_uid).await? == ServiceStatus::Failed {
                self.fail_and_abort(node_uid, "mixed service job failed", tick);
                return Ok(());
            }
        }

        tick.update_tasks.push(Task::UpdateNodeState {
            node_uid: node_uid.clone(),
            new_state: NodeState::Running,
            status: None,
        });
        tick.exec_tasks.push(Task::ExecuteNode {
            node_uid: node_uid.clone(),
            execution_id,
            pipeline_ref: self.pipeline.uid.clone(),
            contexts: vec![contexts.pipeline, contexts.pipeline_run, node_ctx_id],
            inputs: resolved,
            exec_properties: node.parameters.clone(),
            output_artifacts: self.generate_output_artifacts(node, node_id, execution_id),
            executor_output_uri: format!("{}/executor_output.pb", self.execution_base_dir(node_id, execution_id)),
            stateful_working_dir: format!("{}/stateful", self.execution_base_dir(node_id, execution_id)),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache_engine::Sha256CacheEngine;
    use crate::infrastructure::input_resolver::ChannelInputResolver;
    use crate::infrastructure::metadata_store::{schema, SqliteMetadataStore};
    use crate::infrastructure::pipeline_state::{apply_node_state_tasks, InMemoryPipelineState};
    use crate::infrastructure::service_jobs::{NoOpServiceJobManager, ServiceKind, StaticServiceJobManager};
    use crate::infrastructure::successful_nodes_cache::MapSuccessfulNodesCache;
    use crate::infrastructure::task_tracker::InMemoryTaskTracker;
    use sqlx::SqlitePool;
    use sync_pipeline_domain::ir::{
        CachingOptions, DeploymentConfig, ExecutionMode, InputCardinality, InputChannel, InputSpec, NodeExecutionOptions, NodeInputs,
    };
    use sync_pipeline_domain::value_objects::PipelineUid;

    async fn store() -> SqliteMetadataStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        SqliteMetadataStore::new(pool)
    }

    fn linear_pipeline(pipeline_run_id: &str, caching: bool) -> Pipeline {
        let mut trainer_inputs = NodeInputs::new();
        trainer_inputs.insert(
            "examples",
            InputSpec {
                channel: InputChannel::Upstream {
                    producer_node: NodeUid::new("p", "ExampleGen"),
                    output_key: "examples".to_string(),
                },
                cardinality: InputCardinality::List,
                optional: false,
            },
        );

        Pipeline::new(
            PipelineUid::new("p", Some(pipeline_run_id.to_string())),
            ExecutionMode::Sync,
            caching,
            DeploymentConfig::default(),
            vec![
                PipelineNode::new("ExampleGen", NodeInputs::new(), NodeExecutionOptions::default()),
                PipelineNode::new(
                    "Trainer",
                    trainer_inputs,
                    NodeExecutionOptions {
                        caching: CachingOptions { enable_cache: None },
                        ..NodeExecutionOptions::default()
                    },
                ),
            ],
        )
    }

    struct Harness {
        generator: SyncPipelineTaskGenerator<
            SqliteMetadataStore,
            InMemoryPipelineState,
            NoOpServiceJobManager,
            Sha256CacheEngine<SqliteMetadataStore>,
            ChannelInputResolver<SqliteMetadataStore>,
            MapSuccessfulNodesCache,
            InMemoryTaskTracker,
        >,
        store: SqliteMetadataStore,
    }

    async fn harness(pipeline: Pipeline) -> Harness {
        let store = store().await;
        let pipeline_uid = pipeline.uid.clone();
        let generator = SyncPipelineTaskGenerator::new(
            store.clone(),
            InMemoryPipelineState::new(pipeline_uid),
            NoOpServiceJobManager,
            Sha256CacheEngine::new(store.clone()),
            ChannelInputResolver::new(store.clone()),
            MapSuccessfulNodesCache::new(),
            InMemoryTaskTracker::new(),
            pipeline,
        )
        .unwrap();
        Harness { generator, store }
    }

    #[tokio::test]
    async fn first_tick_runs_only_the_root_node() {
        let harness = harness(linear_pipeline("run-1", false)).await;
        let tasks = harness.generator.generate().await.unwrap();

        assert!(tasks.iter().any(|t| matches!(
            t,
            Task::UpdateNodeState { node_uid, new_state: NodeState::Running, .. } if node_uid.node_id() == "ExampleGen"
        )));
        assert!(tasks.iter().any(|t| matches!(t, Task::ExecuteNode { node_uid, .. } if node_uid.node_id() == "ExampleGen")));
        assert!(!tasks.iter().any(|t| t.node_uid().map(|u| u.node_id()) == Some("Trainer")));
    }

    #[tokio::test]
    async fn pipeline_finalizes_ok_once_every_terminal_node_succeeds() {
        let harness = harness(linear_pipeline("run-2", false)).await;

        let first = harness.generator.generate().await.unwrap();
        let exec_id = first
            .iter()
            .find_map(|t| match t {
                Task::ExecuteNode { execution_id, .. } => Some(*execution_id),
                _ => None,
            })
            .unwrap();
        harness
            .store
            .update_execution_state(exec_id, ExecutionState::Complete, None)
            .await
            .unwrap();
        let artifact = harness
            .store
            .create_artifact(Artifact::new("Examples", "/tmp/examples"))
            .await
            .unwrap();
        harness
            .store
            .record_event(exec_id, artifact.id.unwrap(), "examples", false)
            .await
            .unwrap();

        let second = harness.generator.generate().await.unwrap();
        assert!(second
            .iter()
            .any(|t| matches!(t, Task::ExecuteNode { node_uid, .. } if node_uid.node_id() == "Trainer")));

        let trainer_exec = second
            .iter()
            .find_map(|t| match t {
                Task::ExecuteNode { node_uid, execution_id, .. } if node_uid.node_id() == "Trainer" => Some(*execution_id),
                _ => None,
            })
            .unwrap();
        harness
            .store
            .update_execution_state(trainer_exec, ExecutionState::Complete, None)
            .await
            .unwrap();

        let third = harness.generator.generate().await.unwrap();
        assert!(matches!(
            third.last(),
            Some(Task::FinalizePipeline { status }) if status.is_success()
        ));
    }

    #[tokio::test]
    async fn failed_execution_aborts_the_pipeline() {
        let harness = harness(linear_pipeline("run-3", false)).await;

        let first = harness.generator.generate().await.unwrap();
        let exec_id = first
            .iter()
            .find_map(|t| match t {
                Task::ExecuteNode { execution_id, .. } => Some(*execution_id),
                _ => None,
            })
            .unwrap();
        harness
            .store
            .update_execution_state(exec_id, ExecutionState::Failed, Some("boom".to_string()))
            .await
            .unwrap();

        let second = harness.generator.generate().await.unwrap();
        assert!(matches!(second.last(), Some(Task::FinalizePipeline { status }) if !status.is_success()));
        assert!(!second
            .iter()
            .any(|t| matches!(t, Task::ExecuteNode { .. })));
    }

    #[tokio::test]
    async fn tracked_task_blocks_a_duplicate_execute_node_emission() {
        let harness = harness(linear_pipeline("run-tracked", false)).await;
        let example_gen = NodeUid::new("p", "ExampleGen");
        harness.generator.task_tracker.track(exec_task_id(&example_gen));

        let tasks = harness.generator.generate().await.unwrap();
        assert!(!tasks.iter().any(|t| matches!(t, Task::ExecuteNode { .. })));
    }

    #[tokio::test]
    async fn retry_after_failure_resolves_a_fresh_execution() {
        let harness = harness(linear_pipeline("run-retry", false)).await;

        let first = harness.generator.generate().await.unwrap();
        let exec_id = first
            .iter()
            .find_map(|t| match t {
                Task::ExecuteNode { execution_id, .. } => Some(*execution_id),
                _ => None,
            })
            .unwrap();
        harness
            .store
            .update_execution_state(exec_id, ExecutionState::Failed, Some("boom".to_string()))
            .await
            .unwrap();

        let second = harness.generator.generate().await.unwrap();
        assert!(matches!(second.last(), Some(Task::FinalizePipeline { status }) if !status.is_success()));
        apply_node_state_tasks(&harness.generator.pipeline_state, &second).await;

        let example_gen = NodeUid::new("p", "ExampleGen");
        harness.generator.pipeline_state.request_retry(&example_gen).await.unwrap();

        let third = harness.generator.generate().await.unwrap();
        assert!(third
            .iter()
            .any(|t| matches!(t, Task::ExecuteNode { node_uid, .. } if node_uid.node_id() == "ExampleGen")));
        assert!(!third.iter().any(|t| matches!(t, Task::FinalizePipeline { .. })));
    }

    #[tokio::test]
    async fn pure_service_node_emits_running_with_no_store_round_trip() {
        let mut pipeline = linear_pipeline("run-4", false);
        // Replace ExampleGen with a pure service node so the service
        // branch is exercised in isolation.
        let service_node = PipelineNode::new(
            "ExampleGen",
            NodeInputs::new(),
            NodeExecutionOptions {
                is_service_node: true,
                ..NodeExecutionOptions::default()
            },
        );
        pipeline = Pipeline::new(
            pipeline.uid.clone(),
            pipeline.execution_mode,
            pipeline.default_caching_enabled,
            pipeline.deployment_config.clone(),
            vec![service_node, pipeline.node("Trainer").unwrap().clone()],
        );

        let store = store().await;
        let manager = StaticServiceJobManager::new();
        let node_uid = NodeUid::new("p", "ExampleGen");
        manager.classify(node_uid.clone(), ServiceKind::Pure);
        manager.set_status(node_uid, ServiceStatus::Running);

        let generator = SyncPipelineTaskGenerator::new(
            store.clone(),
            InMemoryPipelineState::new(pipeline.uid.clone()),
            manager,
            Sha256CacheEngine::new(store.clone()),
            ChannelInputResolver::new(store),
            MapSuccessfulNodesCache::new(),
            InMemoryTaskTracker::new(),
            pipeline,
        )
        .unwrap();

        let tasks = generator.generate().await.unwrap();
        assert!(tasks.iter().any(|t| matches!(
            t,
            Task::UpdateNodeState { node_uid, new_state: NodeState::Running, .. } if node_uid.node_id() == "ExampleGen"
        )));
        assert!(!tasks.iter().any(|t| matches!(t, Task::ExecuteNode { .. })));
    }
}
