// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The input-resolver port: turns a node's declared `NodeInputs` into
//! concrete artifacts, by consulting the metadata store for upstream
//! outputs and external queries.

use async_trait::async_trait;

use crate::error::OrchestrationError;
use crate::ir::NodeInputs;
use crate::task::ResolvedInput;

/// The outcome of resolving one node's inputs.
#[derive(Debug, Clone)]
pub enum ResolutionResult {
    /// Every required channel resolved to at least one artifact (or was
    /// optional and empty).
    Resolved(Vec<ResolvedInput>),
    /// A required channel had no matching artifacts; this is not an
    /// error, it means the node isn't ready yet (e.g. upstream hasn't
    /// run) and should be skipped for this tick.
    NotReady { missing_channel: String },
    /// Resolution itself failed for a reason no future tick can resolve
    /// (e.g. a channel names a context that cannot ever exist). Distinct
    /// from `NotReady`: this is a genuine error, not "try again later".
    Error { missing_channel: String, message: String },
}

#[async_trait]
pub trait InputResolver: Send + Sync {
    async fn resolve(
        &self,
        inputs: &NodeInputs,
    ) -> Result<ResolutionResult, OrchestrationError>;
}
