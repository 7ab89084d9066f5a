// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline intermediate representation: an ordered set of nodes,
//! each with declared inputs and execution options, plus pipeline-level
//! defaults.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;
use crate::ir::deployment_config::DeploymentConfig;
use crate::ir::execution_mode::ExecutionMode;
use crate::ir::execution_options::{NodeExecutionOptions, PartialRunOption};
use crate::ir::inputs::NodeInputs;
use crate::ir::outputs::NodeOutputs;
use crate::value_objects::{NodeUid, PipelineUid};

/// A single node in the pipeline IR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineNode {
    pub node_id: String,
    pub inputs: NodeInputs,
    pub outputs: NodeOutputs,
    /// Static exec properties (the IR's parameters), distinct from
    /// resolved inputs: known at IR construction time, not resolved
    /// against the metadata store.
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub options: NodeExecutionOptions,
}

impl PipelineNode {
    pub fn new(node_id: impl Into<String>, inputs: NodeInputs, options: NodeExecutionOptions) -> Self {
        Self {
            node_id: node_id.into(),
            inputs,
            outputs: NodeOutputs::new(),
            parameters: BTreeMap::new(),
            options,
        }
    }

    pub fn with_outputs(mut self, outputs: NodeOutputs) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, serde_json::Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn caching_enabled(&self, pipeline_default: bool) -> bool {
        self.options.caching.enabled(pipeline_default)
    }
}

/// The pipeline IR the task generator, partial-run marker and artifact
/// recycler all operate over. Nodes are stored in the order supplied at
/// construction; `validate` checks that this order is a valid
/// topological sort of the dependency graph implied by node inputs.
///
/// Serializes as an ordered node array (`PipelineWire`) rather than the
/// `node_id`-keyed map it's indexed by internally, and routes
/// deserialization through `Pipeline::new` so a duplicate node id is
/// rejected at the deserialization boundary, not just when a caller
/// happens to build a `Pipeline` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PipelineWire", into = "PipelineWire")]
pub struct Pipeline {
    pub uid: PipelineUid,
    pub execution_mode: ExecutionMode,
    /// Pipeline-level default for `enable_cache` when a node doesn't
    /// override it.
    pub default_caching_enabled: bool,
    pub deployment_config: DeploymentConfig,
    nodes: IndexMap<String, PipelineNode>,
}

#[derive(Serialize, Deserialize)]
struct PipelineWire {
    uid: PipelineUid,
    execution_mode: ExecutionMode,
    default_caching_enabled: bool,
    deployment_config: DeploymentConfig,
    nodes: Vec<PipelineNode>,
}

impl TryFrom<PipelineWire> for Pipeline {
    type Error = OrchestrationError;

    fn try_from(wire: PipelineWire) -> Result<Self, Self::Error> {
        Pipeline::new(
            wire.uid,
            wire.execution_mode,
            wire.default_caching_enabled,
            wire.deployment_config,
            wire.nodes,
        )
    }
}

impl From<Pipeline> for PipelineWire {
    fn from(pipeline: Pipeline) -> Self {
        PipelineWire {
            uid: pipeline.uid,
            execution_mode: pipeline.execution_mode,
            default_caching_enabled: pipeline.default_caching_enabled,
            deployment_config: pipeline.deployment_config,
            nodes: pipeline.nodes.into_values().collect(),
        }
    }
}

impl Pipeline {
    /// Builds a pipeline from its nodes in IR order, rejecting a
    /// duplicate `node_id` rather than silently letting the later node
    /// win - two nodes sharing an id would otherwise collapse into one
    /// entry with no trace of which declaration was discarded.
    pub fn new(
        uid: PipelineUid,
        execution_mode: ExecutionMode,
        default_caching_enabled: bool,
        deployment_config: DeploymentConfig,
        nodes: Vec<PipelineNode>,
    ) -> Result<Self, OrchestrationError> {
        let mut by_id = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            if by_id.contains_key(&node.node_id) {
                return Err(OrchestrationError::IrInvalid(format!(
                    "duplicate node id {} in pipeline IR",
                    node.node_id
                )));
            }
            by_id.insert(node.node_id.clone(), node);
        }
        Ok(Self {
            uid,
            execution_mode,
            default_caching_enabled,
            deployment_config,
            nodes: by_id,
        })
    }

    pub fn node(&self, node_id: &str) -> Option<&PipelineNode> {
        self.nodes.get(node_id)
    }

    /// Nodes in IR declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &PipelineNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_uid(&self, node_id: &str) -> NodeUid {
        NodeUid::new(self.uid.pipeline_name(), node_id)
    }

    /// Overwrites a single node's partial-run marking in place. The only
    /// mutation `mark_pipeline` needs to perform on an otherwise
    /// immutable IR.
    pub fn set_partial_run_option(&mut self, node_id: &str, option: PartialRunOption) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.options.partial_run = option;
        }
    }

    /// Validates the structural invariants the task generator assumes:
    /// sync execution mode, at least one node, a DAG (no cycles, no
    /// dangling producer references) and an IR order that is already a
    /// valid topological sort of that DAG.
    pub fn validate(&self) -> Result<(), OrchestrationError> {
        if self.execution_mode != ExecutionMode::Sync {
            return Err(OrchestrationError::IrInvalid(
                "pipeline execution_mode must be SYNC".to_string(),
            ));
        }
        if self.nodes.is_empty() {
            return Err(OrchestrationError::IrInvalid(
                "pipeline has no nodes".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for (index, node) in self.nodes.values().enumerate() {
            for upstream in node.inputs.upstream_nodes() {
                if upstream.pipeline_name() != self.uid.pipeline_name() {
                    continue;
                }
                if !seen.contains(upstream.node_id()) {
                    return Err(OrchestrationError::IrInvalid(format!(
                        "node {} (position {}) depends on {}, which is not defined earlier in IR order",
                        node.node_id, index, upstream
                    )));
                }
            }
            seen.insert(node.node_id.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::inputs::{InputCardinality, InputChannel, InputSpec};

    fn node(id: &str, upstream: Option<&str>) -> PipelineNode {
        let mut inputs = NodeInputs::new();
        if let Some(upstream) = upstream {
            inputs.insert(
                "examples",
                InputSpec {
                    channel: InputChannel::Upstream {
                        producer_node: NodeUid::new("p", upstream),
                        output_key: "examples".to_string(),
                    },
                    cardinality: InputCardinality::List,
                    optional: false,
                },
            );
        }
        PipelineNode::new(id, inputs, NodeExecutionOptions::default())
    }

    #[test]
    fn validate_accepts_ir_ordered_dag() {
        let pipeline = Pipeline::new(
            PipelineUid::new("p", None),
            ExecutionMode::Sync,
            true,
            DeploymentConfig::default(),
            vec![node("ExampleGen", None), node("Trainer", Some("ExampleGen"))],
        )
        .unwrap();
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn validate_rejects_forward_reference() {
        let pipeline = Pipeline::new(
            PipelineUid::new("p", None),
            ExecutionMode::Sync,
            true,
            DeploymentConfig::default(),
            vec![node("Trainer", Some("ExampleGen")), node("ExampleGen", None)],
        )
        .unwrap();
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn validate_rejects_async_mode() {
        let pipeline = Pipeline::new(
            PipelineUid::new("p", None),
            ExecutionMode::Async,
            true,
            DeploymentConfig::default(),
            vec![node("ExampleGen", None)],
        )
        .unwrap();
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn new_rejects_duplicate_node_id() {
        let result = Pipeline::new(
            PipelineUid::new("p", None),
            ExecutionMode::Sync,
            true,
            DeploymentConfig::default(),
            vec![node("ExampleGen", None), node("ExampleGen", None)],
        );
        assert!(result.is_err());
    }
}
