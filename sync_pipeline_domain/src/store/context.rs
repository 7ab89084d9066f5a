// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

use crate::value_objects::ContextId;

/// The kind of context a `Context` row represents. Mirrors the three
/// context types the metadata store needs to distinguish pipelines,
/// pipeline runs and nodes from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextType {
    Pipeline,
    PipelineRun,
    Node,
}

impl ContextType {
    pub fn type_name(self) -> &'static str {
        match self {
            ContextType::Pipeline => "pipeline",
            ContextType::PipelineRun => "pipeline_run",
            ContextType::Node => "node",
        }
    }
}

/// A grouping of executions and artifacts: a pipeline, a specific run of
/// a pipeline, or a node within a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: Option<ContextId>,
    pub context_type: ContextType,
    pub name: String,
    pub properties: std::collections::BTreeMap<String, serde_json::Value>,
}

impl Context {
    pub fn new(context_type: ContextType, name: impl Into<String>) -> Self {
        Self {
            id: None,
            context_type,
            name: name.into(),
            properties: std::collections::BTreeMap::new(),
        }
    }
}
