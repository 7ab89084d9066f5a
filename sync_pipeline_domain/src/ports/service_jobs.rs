// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The service-job port: long-running, externally managed jobs backing
//! pure and mixed service nodes (e.g. a model server), as distinct from
//! the one-shot executions the metadata store tracks.

use async_trait::async_trait;

use crate::error::OrchestrationError;
use crate::value_objects::NodeUid;

/// The externally observed status of a service job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    NotStarted,
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[async_trait]
pub trait ServiceJobManager: Send + Sync {
    fn is_pure_service_node(&self, node_uid: &NodeUid) -> bool;
    fn is_mixed_service_node(&self, node_uid: &NodeUid) -> bool;

    /// Ensures a service job exists for the node, starting one if
    /// necessary. Idempotent: calling this on an already-running job is
    /// a no-op.
    async fn ensure_started(&self, node_uid: &NodeUid) -> Result<(), OrchestrationError>;

    async fn status(&self, node_uid: &NodeUid) -> Result<ServiceStatus, OrchestrationError>;

    async fn stop(&self, node_uid: &NodeUid) -> Result<(), OrchestrationError>;
}
