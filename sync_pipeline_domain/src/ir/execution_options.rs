// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// Caching configuration for a node. `enable_cache` mirrors the IR's
/// per-node toggle; the pipeline-level default is resolved by the caller
/// before constructing the node (see `PipelineNode::caching_enabled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachingOptions {
    pub enable_cache: Option<bool>,
}

impl CachingOptions {
    pub fn enabled(self, pipeline_default: bool) -> bool {
        self.enable_cache.unwrap_or(pipeline_default)
    }
}

/// Which prior pipeline run a chief node should recycle artifacts from
/// when a partial run doesn't explicitly name a base run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChiefSettings {
    /// Use whichever pipeline run most recently completed.
    LatestPipelineRun,
    /// Use a specific, caller-named run.
    BasePipelineRun { base_run_id: String },
}

/// Whether a node is part of a partial run's "run" set, its "skip but
/// include" set, or untouched by any partial-run marking. Set by
/// `mark_pipeline`, read by the task generator and the artifact
/// recycler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialRunOption {
    /// No partial run in effect; always considered for scheduling.
    Unset,
    /// In the requested run set. At most one node in a marked pipeline
    /// carries `chief`, identifying it as responsible for triggering
    /// artifact recycling once it completes.
    Run { chief: Option<ChiefSettings> },
    /// Outside the requested run set but kept in the IR because a
    /// downstream `Run` node depends on it. `reuse_artifacts` is true
    /// when its outputs should be recycled from a prior run rather than
    /// left unresolved.
    Skip { reuse_artifacts: bool },
}

/// Node-level execution configuration independent of its inputs/outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExecutionOptions {
    pub caching: CachingOptions,
    pub partial_run: PartialRunOption,
    /// Whether this node's executions are the responsibility of a
    /// `ServiceJobManager` rather than a regular task.
    pub is_service_node: bool,
    /// A mixed service node both runs a task AND is tracked by the
    /// service-job manager (e.g. a long-running server that also emits a
    /// startup task).
    pub is_mixed_service_node: bool,
}

impl Default for NodeExecutionOptions {
    fn default() -> Self {
        Self {
            caching: CachingOptions { enable_cache: None },
            partial_run: PartialRunOption::Unset,
            is_service_node: false,
            is_mixed_service_node: false,
        }
    }
}
