// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-local "this node just succeeded" cache, consulted once per
//! layer during a tick before falling back to the metadata store.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use sync_pipeline_domain::ports::SuccessfulNodesCache;
use sync_pipeline_domain::value_objects::{ExecutionId, NodeUid};

const DEFAULT_CAPACITY: usize = 1024;

type CacheKey = (String, NodeUid);

fn key(pipeline_run_id: &str, node_uid: &NodeUid) -> CacheKey {
    (pipeline_run_id.to_string(), node_uid.clone())
}

/// Bounded `SuccessfulNodesCache` backed by an LRU eviction policy, the
/// production default so a long-running deployment juggling many
/// distinct pipelines doesn't grow this without limit.
pub struct LruSuccessfulNodesCache {
    inner: Mutex<LruCache<CacheKey, ExecutionId>>,
}

impl LruSuccessfulNodesCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for LruSuccessfulNodesCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SuccessfulNodesCache for LruSuccessfulNodesCache {
    fn record_success(&self, pipeline_run_id: &str, node_uid: NodeUid, execution_id: ExecutionId) {
        self.inner.lock().put(key(pipeline_run_id, &node_uid), execution_id);
    }

    fn get(&self, pipeline_run_id: &str, node_uid: &NodeUid) -> Option<ExecutionId> {
        self.inner.lock().get(&key(pipeline_run_id, node_uid)).copied()
    }

    fn invalidate(&self, pipeline_run_id: &str, node_uid: &NodeUid) {
        self.inner.lock().pop(&key(pipeline_run_id, node_uid));
    }
}

/// Unbounded, deterministic `SuccessfulNodesCache` for tests: a plain
/// map with no eviction, so assertions about cache contents don't have
/// to account for LRU ordering.
#[derive(Default)]
pub struct MapSuccessfulNodesCache {
    inner: Mutex<HashMap<CacheKey, ExecutionId>>,
}

impl MapSuccessfulNodesCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuccessfulNodesCache for MapSuccessfulNodesCache {
    fn record_success(&self, pipeline_run_id: &str, node_uid: NodeUid, execution_id: ExecutionId) {
        self.inner.lock().insert(key(pipeline_run_id, &node_uid), execution_id);
    }

    fn get(&self, pipeline_run_id: &str, node_uid: &NodeUid) -> Option<ExecutionId> {
        self.inner.lock().get(&key(pipeline_run_id, node_uid)).copied()
    }

    fn invalidate(&self, pipeline_run_id: &str, node_uid: &NodeUid) {
        self.inner.lock().remove(&key(pipeline_run_id, node_uid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lru_cache_evicts_oldest_entry_past_capacity() {
        let cache = LruSuccessfulNodesCache::with_capacity(1);
        let a = NodeUid::new("p", "A");
        let b = NodeUid::new("p", "B");
        cache.record_success("run-1", a.clone(), ExecutionId(1));
        cache.record_success("run-1", b.clone(), ExecutionId(2));

        assert_eq!(cache.get("run-1", &a), None);
        assert_eq!(cache.get("run-1", &b), Some(ExecutionId(2)));
    }

    #[test]
    fn map_cache_has_no_eviction() {
        let cache = MapSuccessfulNodesCache::new();
        let a = NodeUid::new("p", "A");
        cache.record_success("run-1", a.clone(), ExecutionId(1));
        assert_eq!(cache.get("run-1", &a), Some(ExecutionId(1)));
        cache.invalidate("run-1", &a);
        assert_eq!(cache.get("run-1", &a), None);
    }

    #[test]
    fn distinct_runs_of_the_same_node_do_not_collide() {
        let cache = MapSuccessfulNodesCache::new();
        let a = NodeUid::new("p", "A");
        cache.record_success("run-1", a.clone(), ExecutionId(1));
        cache.record_success("run-2", a.clone(), ExecutionId(2));

        assert_eq!(cache.get("run-1", &a), Some(ExecutionId(1)));
        assert_eq!(cache.get("run-2", &a), Some(ExecutionId(2)));
    }
}
