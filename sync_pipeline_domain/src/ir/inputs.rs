// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A node's declared inputs: named channels, each sourced from either an
//! upstream node's output or an external query against the metadata
//! store.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value_objects::NodeUid;

/// Where a single input channel's artifacts come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputChannel {
    /// Consume the named output key of an upstream node.
    Upstream {
        producer_node: NodeUid,
        output_key: String,
    },
    /// Query the metadata store directly (e.g. an external, already
    /// materialized artifact not produced by any node in this pipeline).
    External { query: String },
}

impl InputChannel {
    /// The upstream node this channel depends on, if any. Used to build
    /// the dependency edges of the pipeline DAG.
    pub fn producer(&self) -> Option<&NodeUid> {
        match self {
            InputChannel::Upstream { producer_node, .. } => Some(producer_node),
            InputChannel::External { .. } => None,
        }
    }
}

/// Resolution behavior for one input channel: exactly one artifact,
/// any number, or a min/max count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputCardinality {
    Single,
    List,
}

/// A single named input of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub channel: InputChannel,
    pub cardinality: InputCardinality,
    /// Channels marked optional do not block resolution when empty.
    pub optional: bool,
}

/// The complete set of a node's named inputs, keyed by input name and
/// order-preserving (the order is significant for deterministic
/// fingerprinting).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInputs {
    channels: IndexMap<String, InputSpec>,
}

impl NodeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: InputSpec) {
        self.channels.insert(name.into(), spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputSpec)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// The distinct upstream nodes this node's inputs depend on, in
    /// declaration order, de-duplicated.
    pub fn upstream_nodes(&self) -> Vec<NodeUid> {
        let mut seen = IndexMap::new();
        for (_, spec) in self.channels.iter() {
            if let Some(producer) = spec.channel.producer() {
                seen.entry(producer.clone()).or_insert(());
            }
        }
        seen.into_keys().collect()
    }
}
