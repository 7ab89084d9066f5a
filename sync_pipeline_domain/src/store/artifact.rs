// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

use crate::value_objects::ArtifactId;

/// Lifecycle state of a materialized artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactState {
    Pending,
    Live,
    Deleted,
    MarkedForDeletion,
    Abandoned,
}

/// An artifact produced (or consumed) by a node execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Option<ArtifactId>,
    pub type_name: String,
    pub uri: String,
    pub state: ArtifactState,
    pub properties: std::collections::BTreeMap<String, serde_json::Value>,
}

impl Artifact {
    pub fn new(type_name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: None,
            type_name: type_name.into(),
            uri: uri.into(),
            state: ArtifactState::Pending,
            properties: std::collections::BTreeMap::new(),
        }
    }
}
