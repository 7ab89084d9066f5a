// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Identity value objects.
//!
//! Pipeline and node identity is caller-supplied (it comes from the IR),
//! so these wrap plain strings. Execution, context and artifact identity
//! is assigned by the metadata store, so those wrap `i64` row ids.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a pipeline, scoped to a single orchestrator
/// deployment. Combines the pipeline's name with its run id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineUid {
    pipeline_name: String,
    pipeline_run_id: Option<String>,
}

impl PipelineUid {
    pub fn new(pipeline_name: impl Into<String>, pipeline_run_id: Option<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            pipeline_run_id,
        }
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn pipeline_run_id(&self) -> Option<&str> {
        self.pipeline_run_id.as_deref()
    }
}

impl fmt::Display for PipelineUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pipeline_run_id {
            Some(run_id) => write!(f, "{}:{}", self.pipeline_name, run_id),
            None => write!(f, "{}", self.pipeline_name),
        }
    }
}

/// Unique identifier of a node within a pipeline: `{pipeline_name}.{node_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeUid {
    pipeline_name: String,
    node_id: String,
}

impl NodeUid {
    pub fn new(pipeline_name: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            node_id: node_id.into(),
        }
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

impl fmt::Display for NodeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pipeline_name, self.node_id)
    }
}

/// Row id of an `Execution` in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutionId(pub i64);

/// Row id of a `Context` in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub i64);

/// Row id of an `Artifact` in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub i64);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a task the generator handed to its caller. Opaque to the
/// generator itself - it only needs enough identity to ask a
/// [`crate::ports::TaskTracker`] "is this one still yours?"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_uid_display_matches_pipeline_dot_node() {
        let uid = NodeUid::new("my_pipeline", "Trainer");
        assert_eq!(uid.to_string(), "my_pipeline.Trainer");
    }

    #[test]
    fn pipeline_uid_display_includes_run_id_when_present() {
        let uid = PipelineUid::new("my_pipeline", Some("run-1".to_string()));
        assert_eq!(uid.to_string(), "my_pipeline:run-1");
        let uid = PipelineUid::new("my_pipeline", None);
        assert_eq!(uid.to_string(), "my_pipeline");
    }
}
