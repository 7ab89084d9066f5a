// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Service-job manager adapters. Pure and mixed service nodes (e.g. a
//! model server) are out of scope for this core's own lifecycle
//! management; these adapters classify nodes and report status on its
//! behalf.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ports::{ServiceJobManager, ServiceStatus};
use sync_pipeline_domain::value_objects::NodeUid;

/// Default manager for pipelines with no service nodes: every node is
/// a plain executor node.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpServiceJobManager;

#[async_trait]
impl ServiceJobManager for NoOpServiceJobManager {
    fn is_pure_service_node(&self, _node_uid: &NodeUid) -> bool {
        false
    }

    fn is_mixed_service_node(&self, _node_uid: &NodeUid) -> bool {
        false
    }

    async fn ensure_started(&self, _node_uid: &NodeUid) -> Result<(), OrchestrationError> {
        Ok(())
    }

    async fn status(&self, _node_uid: &NodeUid) -> Result<ServiceStatus, OrchestrationError> {
        Ok(ServiceStatus::NotStarted)
    }

    async fn stop(&self, _node_uid: &NodeUid) -> Result<(), OrchestrationError> {
        Ok(())
    }
}

/// A node's service classification, as tracked by `StaticServiceJobManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// A regular executor node (the default).
    None,
    /// Entirely managed by the service-job manager; never produces an
    /// `ExecNodeTask`.
    Pure,
    /// Both tracked by the service-job manager and emits a task.
    Mixed,
}

/// Pre-seeded `ServiceJobManager` for tests and demo wiring: node
/// classifications and reported statuses are set up ahead of time
/// rather than discovered from a live service registry.
#[derive(Default)]
pub struct StaticServiceJobManager {
    kinds: RwLock<HashMap<NodeUid, ServiceKind>>,
    statuses: RwLock<HashMap<NodeUid, ServiceStatus>>,
}

impl StaticServiceJobManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, node_uid: NodeUid, kind: ServiceKind) -> &Self {
        self.kinds.write().unwrap().insert(node_uid, kind);
        self
    }

    pub fn set_status(&self, node_uid: NodeUid, status: ServiceStatus) -> &Self {
        self.statuses.write().unwrap().insert(node_uid, status);
        self
    }

    fn kind_of(&self, node_uid: &NodeUid) -> ServiceKind {
        self.kinds
            .read()
            .unwrap()
            .get(node_uid)
            .copied()
            .unwrap_or(ServiceKind::None)
    }
}

#[async_trait]
impl ServiceJobManager for StaticServiceJobManager {
    fn is_pure_service_node(&self, node_uid: &NodeUid) -> bool {
        self.kind_of(node_uid) == ServiceKind::Pure
    }

    fn is_mixed_service_node(&self, node_uid: &NodeUid) -> bool {
        self.kind_of(node_uid) == ServiceKind::Mixed
    }

    async fn ensure_started(&self, node_uid: &NodeUid) -> Result<(), OrchestrationError> {
        self.statuses
            .write()
            .unwrap()
            .entry(node_uid.clone())
            .or_insert(ServiceStatus::Running);
        Ok(())
    }

    async fn status(&self, node_uid: &NodeUid) -> Result<ServiceStatus, OrchestrationError> {
        Ok(self
            .statuses
            .read()
            .unwrap()
            .get(node_uid)
            .copied()
            .unwrap_or(ServiceStatus::NotStarted))
    }

    async fn stop(&self, node_uid: &NodeUid) -> Result<(), OrchestrationError> {
        self.statuses
            .write()
            .unwrap()
            .insert(node_uid.clone(), ServiceStatus::NotStarted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_manager_never_classifies_a_service_node() {
        let manager = NoOpServiceJobManager;
        let uid = NodeUid::new("p", "Trainer");
        assert!(!manager.is_pure_service_node(&uid));
        assert!(!manager.is_mixed_service_node(&uid));
        assert_eq!(manager.status(&uid).await.unwrap(), ServiceStatus::NotStarted);
    }

    #[tokio::test]
    async fn static_manager_reports_seeded_classification_and_status() {
        let manager = StaticServiceJobManager::new();
        let uid = NodeUid::new("p", "ModelServer");
        manager.classify(uid.clone(), ServiceKind::Pure);
        manager.set_status(uid.clone(), ServiceStatus::Running);

        assert!(manager.is_pure_service_node(&uid));
        assert_eq!(manager.status(&uid).await.unwrap(), ServiceStatus::Running);
    }
}
