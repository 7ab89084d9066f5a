// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A node's declared outputs: named channels, each with the artifact type
//! it produces. Declared statically in the IR (unlike inputs, outputs
//! don't resolve against the metadata store) so both the task generator
//! and the cache fingerprint can read a node's output shape without a
//! completed execution to inspect.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The artifact type an output channel produces, e.g. `"Examples"` or
/// `"Model"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub type_name: String,
}

/// The complete set of a node's named outputs, keyed by output name and
/// order-preserving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutputs {
    channels: IndexMap<String, OutputSpec>,
}

impl NodeOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: OutputSpec) {
        self.channels.insert(name.into(), spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputSpec)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
