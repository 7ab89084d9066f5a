// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus counters for the operations this binary performs: ticks,
//! tasks generated, cache hits, node failures by category, and artifacts
//! recycled. One process runs one command and exits, so there is no
//! scrape endpoint here - `MetricsService::render` is what a caller
//! wanting text-format output would call (e.g. before exiting, or from a
//! wrapping long-running driver that ticks in a loop).

use std::sync::Arc;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use sync_pipeline_domain::error::OrchestrationError;

/// Prometheus metrics for the orchestration core.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,
    ticks_total: IntCounter,
    tick_duration_seconds: Histogram,
    tasks_generated_total: IntCounter,
    cache_hits_total: IntCounter,
    node_failures_total: IntCounterVec,
    artifacts_recycled_total: IntCounter,
}

impl MetricsService {
    pub fn new() -> Result<Self, OrchestrationError> {
        let registry = Registry::new();

        let ticks_total = IntCounter::with_opts(
            Opts::new("ticks_total", "Total number of generate() ticks run").namespace("sync_pipeline"),
        )
        .map_err(|e| OrchestrationError::Internal(format!("creating ticks_total metric: {e}")))?;

        let tick_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("tick_duration_seconds", "Wall time spent in one generate() tick")
                .namespace("sync_pipeline")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .map_err(|e| OrchestrationError::Internal(format!("creating tick_duration_seconds metric: {e}")))?;

        let tasks_generated_total = IntCounter::with_opts(
            Opts::new("tasks_generated_total", "Total tasks emitted across all ticks").namespace("sync_pipeline"),
        )
        .map_err(|e| OrchestrationError::Internal(format!("creating tasks_generated_total metric: {e}")))?;

        let cache_hits_total = IntCounter::with_opts(
            Opts::new("cache_hits_total", "Total nodes resolved via cache reuse").namespace("sync_pipeline"),
        )
        .map_err(|e| OrchestrationError::Internal(format!("creating cache_hits_total metric: {e}")))?;

        let node_failures_total = IntCounterVec::new(
            Opts::new("node_failures_total", "Total node/operation failures by error category")
                .namespace("sync_pipeline"),
            &["category"],
        )
        .map_err(|e| OrchestrationError::Internal(format!("creating node_failures_total metric: {e}")))?;

        let artifacts_recycled_total = IntCounter::with_opts(
            Opts::new("artifacts_recycled_total", "Total executions republished by the artifact recycler")
                .namespace("sync_pipeline"),
        )
        .map_err(|e| OrchestrationError::Internal(format!("creating artifacts_recycled_total metric: {e}")))?;

        registry
            .register(Box::new(ticks_total.clone()))
            .map_err(|e| OrchestrationError::Internal(format!("registering ticks_total: {e}")))?;
        registry
            .register(Box::new(tick_duration_seconds.clone()))
            .map_err(|e| OrchestrationError::Internal(format!("registering tick_duration_seconds: {e}")))?;
        registry
            .register(Box::new(tasks_generated_total.clone()))
            .map_err(|e| OrchestrationError::Internal(format!("registering tasks_generated_total: {e}")))?;
        registry
            .register(Box::new(cache_hits_total.clone()))
            .map_err(|e| OrchestrationError::Internal(format!("registering cache_hits_total: {e}")))?;
        registry
            .register(Box::new(node_failures_total.clone()))
            .map_err(|e| OrchestrationError::Internal(format!("registering node_failures_total: {e}")))?;
        registry
            .register(Box::new(artifacts_recycled_total.clone()))
            .map_err(|e| OrchestrationError::Internal(format!("registering artifacts_recycled_total: {e}")))?;

        Ok(Self {
            registry: Arc::new(registry),
            ticks_total,
            tick_duration_seconds,
            tasks_generated_total,
            cache_hits_total,
            node_failures_total,
            artifacts_recycled_total,
        })
    }

    /// Records one completed tick: its duration, the number of tasks it
    /// emitted, and how many of those were cache hits.
    pub fn record_tick(&self, duration: std::time::Duration, task_count: u64, cache_hit_count: u64) {
        self.ticks_total.inc();
        self.tick_duration_seconds.observe(duration.as_secs_f64());
        self.tasks_generated_total.inc_by(task_count);
        self.cache_hits_total.inc_by(cache_hit_count);
    }

    /// Records a failure, labeled by `OrchestrationError::category()`.
    pub fn record_failure(&self, category: &str) {
        self.node_failures_total.with_label_values(&[category]).inc();
    }

    pub fn record_artifacts_recycled(&self, count: u64) {
        self.artifacts_recycled_total.inc_by(count);
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn render(&self) -> Result<String, OrchestrationError> {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| OrchestrationError::Internal(format!("encoding metrics: {e}")))
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new().expect("metric registration with static, non-conflicting names cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn records_tick_and_renders_counters() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_tick(Duration::from_millis(5), 3, 1);
        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("sync_pipeline_ticks_total 1"));
        assert!(rendered.contains("sync_pipeline_tasks_generated_total 3"));
        assert!(rendered.contains("sync_pipeline_cache_hits_total 1"));
    }

    #[test]
    fn records_failure_with_category_label() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_failure("store");
        metrics.record_failure("store");
        metrics.record_failure("ir");
        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("category=\"store\""));
        assert!(rendered.contains("category=\"ir\""));
    }
}
