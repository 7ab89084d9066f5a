// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete adapters for the domain's ports, plus the ambient concerns
//! (configuration, logging) that sit alongside them.

pub mod cache_engine;
pub mod config;
pub mod input_resolver;
pub mod logging;
pub mod metadata_store;
pub mod metrics;
pub mod pipeline_state;
pub mod service_jobs;
pub mod successful_nodes_cache;
pub mod task_tracker;

pub use cache_engine::Sha256CacheEngine;
pub use config::OrchestratorConfig;
pub use input_resolver::ChannelInputResolver;
pub use logging::init_logging;
pub use metadata_store::SqliteMetadataStore;
pub use metrics::MetricsService;
pub use pipeline_state::{apply_node_state_tasks, InMemoryPipelineState, PipelineStateScope};
pub use service_jobs::{NoOpServiceJobManager, ServiceKind, StaticServiceJobManager};
pub use successful_nodes_cache::{LruSuccessfulNodesCache, MapSuccessfulNodesCache};
pub use task_tracker::InMemoryTaskTracker;
