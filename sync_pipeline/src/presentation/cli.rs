// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Subcommand handlers: `tick` runs one generation tick, `mark-partial`
//! rewrites an IR for a partial run, `recycle` republishes a prior run's
//! artifacts directly from a caller-supplied reuse set.

use std::path::Path;

use sync_pipeline_bootstrap::{ValidatedCli, ValidatedCommand};
use sync_pipeline_domain::dag;
use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ir::{ChiefSettings, Pipeline, PartialRunOption};
use sync_pipeline_domain::task::Task;
use sync_pipeline_domain::value_objects::PipelineUid;

use crate::application::partial_run_marker::filter_deployment_config;
use crate::application::{mark_pipeline, ArtifactRecycler, SyncPipelineTaskGenerator};
use crate::infrastructure::metadata_store::schema;
use crate::infrastructure::{
    ChannelInputResolver, InMemoryPipelineState, InMemoryTaskTracker, LruSuccessfulNodesCache, MetricsService,
    NoOpServiceJobManager, OrchestratorConfig, Sha256CacheEngine, SqliteMetadataStore,
};

/// Dispatches a validated command to its handler.
pub async fn run(cli: ValidatedCli, config: OrchestratorConfig) -> Result<(), OrchestrationError> {
    let db_override = cli.db.clone();
    let metrics = MetricsService::new()?;

    let result = match cli.command {
        ValidatedCommand::Tick {
            pipeline_ir,
            pipeline_run_id,
            dry_run,
        } => {
            run_tick(
                &pipeline_ir,
                pipeline_run_id,
                dry_run,
                &config,
                db_override.as_deref(),
                &metrics,
            )
            .await
        }
        ValidatedCommand::MarkPartial {
            pipeline_ir,
            from_nodes,
            to_nodes,
            output,
        } => run_mark_partial(&pipeline_ir, &from_nodes, &to_nodes, &output),
        ValidatedCommand::Recycle {
            pipeline_ir,
            pipeline_run_id,
            reuse_nodes,
        } => {
            run_recycle(
                &pipeline_ir,
                pipeline_run_id,
                &reuse_nodes,
                &config,
                db_override.as_deref(),
                &metrics,
            )
            .await
        }
    };

    if let Err(ref e) = result {
        metrics.record_failure(e.category());
    }
    result
}

fn load_pipeline(path: &Path) -> Result<Pipeline, OrchestrationError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OrchestrationError::Internal(format!("reading pipeline IR {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| OrchestrationError::IrInvalid(format!("parsing pipeline IR {}: {e}", path.display())))
}

fn write_pipeline(pipeline: &Pipeline, path: &Path) -> Result<(), OrchestrationError> {
    let text = serde_json::to_string_pretty(pipeline)
        .map_err(|e| OrchestrationError::Internal(format!("serializing pipeline IR: {e}")))?;
    std::fs::write(path, text)
        .map_err(|e| OrchestrationError::Internal(format!("writing pipeline IR {}: {e}", path.display())))
}

fn print_tasks(tasks: &[Task]) {
    match serde_json::to_string_pretty(tasks) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "failed to serialize tasks for output"),
    }
}

/// A `--db` override wins over the configured `database_url`; dry runs
/// never touch the configured store at all, so tasks are computed
/// against a throwaway in-memory one instead.
fn resolve_database_url(db_override: Option<&Path>, dry_run: bool, config: &OrchestratorConfig) -> String {
    if dry_run {
        return "sqlite::memory:".to_string();
    }
    match db_override {
        Some(path) => format!("sqlite://{}", path.display()),
        None => config.database_url.clone(),
    }
}

async fn open_store(database_url: &str) -> Result<SqliteMetadataStore, OrchestrationError> {
    let pool = schema::initialize_database(database_url)
        .await
        .map_err(|e| OrchestrationError::Store(e.to_string()))?;
    Ok(SqliteMetadataStore::new(pool))
}

async fn run_tick(
    pipeline_ir: &Path,
    pipeline_run_id: Option<String>,
    dry_run: bool,
    config: &OrchestratorConfig,
    db_override: Option<&Path>,
    metrics: &MetricsService,
) -> Result<(), OrchestrationError> {
    let mut pipeline = load_pipeline(pipeline_ir)?;
    if let Some(run_id) = pipeline_run_id {
        pipeline.uid = PipelineUid::new(pipeline.uid.pipeline_name().to_string(), Some(run_id));
    }

    let database_url = resolve_database_url(db_override, dry_run, config);
    let store = open_store(&database_url).await?;
    let pipeline_uid = pipeline.uid.clone();

    // A tick invocation is a fresh process each time, so there is no
    // persisted task queue to consult: an empty tracker is exactly
    // right, falling through to re-deriving each node's task from its
    // latest execution instead of treating anything as already in flight.
    let generator = SyncPipelineTaskGenerator::new(
        store.clone(),
        InMemoryPipelineState::new(pipeline_uid),
        NoOpServiceJobManager,
        Sha256CacheEngine::new(store.clone()),
        ChannelInputResolver::new(store),
        LruSuccessfulNodesCache::with_capacity(config.successful_nodes_cache_capacity),
        InMemoryTaskTracker::new(),
        pipeline,
    )?;

    let started = std::time::Instant::now();
    let tasks = generator.generate().await?;
    let cache_hits = tasks.iter().filter(|t| matches!(t, Task::CacheHit { .. })).count();
    metrics.record_tick(started.elapsed(), tasks.len() as u64, cache_hits as u64);

    tracing::info!(task_count = tasks.len(), cache_hits, dry_run, "tick complete");
    print_tasks(&tasks);
    Ok(())
}

fn run_mark_partial(
    pipeline_ir: &Path,
    from_nodes: &[String],
    to_nodes: &[String],
    output: &Path,
) -> Result<(), OrchestrationError> {
    let mut pipeline = load_pipeline(pipeline_ir)?;

    let to_ids: Vec<String> = if to_nodes.is_empty() {
        let node_upstream = dag::ordered_node_map(&pipeline);
        dag::terminal_node_ids(&node_upstream)
    } else {
        to_nodes.to_vec()
    };
    let from_ids = from_nodes.to_vec();

    mark_pipeline(
        &mut pipeline,
        |id| from_ids.iter().any(|f| f == id),
        |id| to_ids.iter().any(|t| t == id),
        ChiefSettings::LatestPipelineRun,
    )?;
    pipeline.deployment_config = filter_deployment_config(&pipeline);

    write_pipeline(&pipeline, output)?;
    tracing::info!(
        from = ?from_nodes,
        to = ?to_ids,
        output = %output.display(),
        "pipeline marked for partial run"
    );
    Ok(())
}

/// Marks every node outside `reuse_nodes` to run (the first such node,
/// in IR order, becoming chief) and every named node to skip-and-reuse,
/// then recycles directly - a lower-level entry point than
/// `mark-partial` followed by a tick, useful when the caller already
/// knows exactly which nodes it wants carried forward.
async fn run_recycle(
    pipeline_ir: &Path,
    pipeline_run_id: String,
    reuse_nodes: &[String],
    config: &OrchestratorConfig,
    db_override: Option<&Path>,
    metrics: &MetricsService,
) -> Result<(), OrchestrationError> {
    let mut pipeline = load_pipeline(pipeline_ir)?;

    let mut chief_assigned = false;
    let node_ids: Vec<String> = pipeline.nodes().map(|n| n.node_id.clone()).collect();
    for node_id in &node_ids {
        let option = if reuse_nodes.iter().any(|r| r == node_id) {
            PartialRunOption::Skip { reuse_artifacts: true }
        } else if chief_assigned {
            PartialRunOption::Run { chief: None }
        } else {
            chief_assigned = true;
            PartialRunOption::Run {
                chief: Some(ChiefSettings::LatestPipelineRun),
            }
        };
        pipeline.set_partial_run_option(node_id, option);
    }

    let database_url = resolve_database_url(db_override, false, config);
    let store = open_store(&database_url).await?;
    let recycler = ArtifactRecycler::new(store);
    let recycled = recycler
        .reuse_pipeline_run_artifacts(&pipeline, None, Some(pipeline_run_id.clone()))
        .await?;
    metrics.record_artifacts_recycled(recycled as u64);

    tracing::info!(pipeline_run_id, recycled, "artifact recycling complete");
    println!("recycled {recycled} node execution(s) into run {pipeline_run_id}");
    Ok(())
}
