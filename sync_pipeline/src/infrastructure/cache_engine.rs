// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cache-engine adapter backed by the metadata store: a fingerprint is
//! recorded as a dedicated `Context` whose name is the fingerprint's hex
//! digest, linked to the execution that produced it.

use async_trait::async_trait;

use sync_pipeline_domain::cache::{compute_fingerprint, CacheFingerprint};
use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ports::{CacheEngine, MetadataStoreHandle};
use sync_pipeline_domain::store::{Context, ContextType};
use sync_pipeline_domain::value_objects::ExecutionId;

const FINGERPRINT_PROPERTY: &str = "execution_id";

fn context_name(fingerprint: &CacheFingerprint) -> String {
    format!("fp:{}", fingerprint.to_hex())
}

/// `CacheEngine` grounded on a `MetadataStoreHandle`: fingerprints are
/// cache contexts carrying the producing execution's id as a property,
/// so cache hits survive process restarts.
pub struct Sha256CacheEngine<M> {
    store: M,
}

impl<M> Sha256CacheEngine<M> {
    pub fn new(store: M) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<M> CacheEngine for Sha256CacheEngine<M>
where
    M: MetadataStoreHandle,
{
    async fn lookup(
        &self,
        fingerprint: &CacheFingerprint,
    ) -> Result<Option<ExecutionId>, OrchestrationError> {
        let name = context_name(fingerprint);
        let context = self.store.get_context(ContextType::Node, &name).await?;
        Ok(context.and_then(|ctx| {
            ctx.properties
                .get(FINGERPRINT_PROPERTY)
                .and_then(|v| v.as_i64())
                .map(ExecutionId)
        }))
    }

    async fn record(
        &self,
        fingerprint: CacheFingerprint,
        execution_id: ExecutionId,
    ) -> Result<(), OrchestrationError> {
        let mut context = Context::new(ContextType::Node, context_name(&fingerprint));
        context
            .properties
            .insert(FINGERPRINT_PROPERTY.to_string(), serde_json::json!(execution_id.0));
        self.store.get_or_create_context(context).await?;
        Ok(())
    }
}
