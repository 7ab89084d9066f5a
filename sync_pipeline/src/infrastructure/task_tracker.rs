// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-memory task tracker: a set of task ids a caller has told us are
//! still in flight. A fresh, empty tracker is equivalent to "nothing is
//! tracked", which is exactly right for a caller that restarted and lost
//! its queue - the generator falls through to re-deriving each node's
//! task from its latest execution instead.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use sync_pipeline_domain::ports::TaskTracker;
use sync_pipeline_domain::value_objects::TaskId;

#[derive(Clone, Default)]
pub struct InMemoryTaskTracker {
    tracked: Arc<RwLock<HashSet<TaskId>>>,
}

impl InMemoryTaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, task_id: TaskId) {
        self.tracked.write().insert(task_id);
    }

    pub fn untrack(&self, task_id: &TaskId) {
        self.tracked.write().remove(task_id);
    }
}

impl TaskTracker for InMemoryTaskTracker {
    fn is_task_id_tracked(&self, task_id: &TaskId) -> bool {
        self.tracked.read().contains(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_task_id_is_not_tracked() {
        let tracker = InMemoryTaskTracker::new();
        assert!(!tracker.is_task_id_tracked(&TaskId::new("x")));
    }

    #[test]
    fn tracked_task_id_is_tracked_until_untracked() {
        let tracker = InMemoryTaskTracker::new();
        let id = TaskId::new("x");
        tracker.track(id.clone());
        assert!(tracker.is_task_id_tracked(&id));
        tracker.untrack(&id);
        assert!(!tracker.is_task_id_tracked(&id));
    }
}
