// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The cache-engine port: looks up and records the execution that
//! produced a given cache fingerprint, so a node with matching inputs
//! can reuse a prior run's outputs instead of re-executing.

use async_trait::async_trait;

use crate::cache::CacheFingerprint;
use crate::error::OrchestrationError;
use crate::value_objects::ExecutionId;

#[async_trait]
pub trait CacheEngine: Send + Sync {
    async fn lookup(
        &self,
        fingerprint: &CacheFingerprint,
    ) -> Result<Option<ExecutionId>, OrchestrationError>;

    async fn record(
        &self,
        fingerprint: CacheFingerprint,
        execution_id: ExecutionId,
    ) -> Result<(), OrchestrationError>;
}
