// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Default `InputResolver`: resolves each declared channel against the
//! metadata store, either by following an upstream node's latest
//! successful execution or by looking up a directly named external
//! context.

use async_trait::async_trait;

use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ir::{InputCardinality, InputChannel, NodeInputs};
use sync_pipeline_domain::ports::{InputResolver, MetadataStoreHandle, ResolutionResult};
use sync_pipeline_domain::store::{Artifact, ContextType, ExecutionState};
use sync_pipeline_domain::task::ResolvedInput;

/// Resolves channels against a `MetadataStoreHandle`: an `Upstream`
/// channel follows `{producer_node}`'s node context to its most recent
/// successful execution and takes that execution's outputs under
/// `output_key`; an `External` channel is looked up as a node context
/// named directly by the query string, since it was never produced by
/// any node in this pipeline.
pub struct ChannelInputResolver<M> {
    store: M,
}

impl<M> ChannelInputResolver<M> {
    pub fn new(store: M) -> Self {
        Self { store }
    }
}

impl<M> ChannelInputResolver<M>
where
    M: MetadataStoreHandle,
{
    /// `Ok(None)` means the node context itself doesn't exist yet;
    /// `Ok(Some(outputs))` means it exists (whether or not it has a
    /// successful execution yet). Callers use the distinction to tell
    /// "not ready yet" apart from "this will never resolve".
    async fn latest_successful_outputs(
        &self,
        context_name: &str,
    ) -> Result<Option<Vec<(String, Artifact)>>, OrchestrationError> {
        let context = match self.store.get_context(ContextType::Node, context_name).await? {
            Some(context) => context,
            None => return Ok(None),
        };
        let context_id = match context.id {
            Some(id) => id,
            None => return Ok(None),
        };
        let executions = self.store.get_executions_for_context(context_id).await?;
        let latest_success = executions
            .into_iter()
            .find(|execution| execution.state == ExecutionState::Complete);
        match latest_success {
            Some(execution) => Ok(Some(
                self.store
                    .output_artifacts_of(execution.id.expect("persisted execution has an id"))
                    .await?,
            )),
            None => Ok(Some(Vec::new())),
        }
    }

    async fn resolve_one(
        &self,
        name: &str,
        channel: &InputChannel,
        cardinality: InputCardinality,
        optional: bool,
    ) -> Result<ResolveOneOutcome, OrchestrationError> {
        let context_name = match channel {
            InputChannel::Upstream { producer_node, .. } => producer_node.to_string(),
            InputChannel::External { query } => query.clone(),
        };
        let output_key = match channel {
            InputChannel::Upstream { output_key, .. } => Some(output_key.as_str()),
            InputChannel::External { .. } => None,
        };

        let outputs = match self.latest_successful_outputs(&context_name).await? {
            Some(outputs) => outputs,
            // An `External` channel names a context this pipeline never
            // produces itself; if it doesn't exist, no future tick will
            // make it appear, so this is a genuine error rather than
            // "not ready yet". An `Upstream` channel's context is simply
            // created once its producer node first runs.
            None if matches!(channel, InputChannel::External { .. }) => {
                return Ok(ResolveOneOutcome::Error(format!(
                    "external channel {name} references context {context_name}, which does not exist"
                )));
            }
            None => Vec::new(),
        };

        let mut artifacts: Vec<Artifact> = outputs
            .into_iter()
            .filter(|(channel_name, _)| output_key.map(|k| k == channel_name).unwrap_or(true))
            .map(|(_, artifact)| artifact)
            .collect();

        if cardinality == InputCardinality::Single {
            artifacts.truncate(1);
        }

        if artifacts.is_empty() && !optional {
            return Ok(ResolveOneOutcome::NotReady);
        }
        Ok(ResolveOneOutcome::Ready(artifacts))
    }
}

enum ResolveOneOutcome {
    Ready(Vec<Artifact>),
    NotReady,
    Error(String),
}

#[async_trait]
impl<M> InputResolver for ChannelInputResolver<M>
where
    M: MetadataStoreHandle,
{
    async fn resolve(&self, inputs: &NodeInputs) -> Result<ResolutionResult, OrchestrationError> {
        let mut resolved = Vec::new();
        for (name, spec) in inputs.iter() {
            match self
                .resolve_one(name, &spec.channel, spec.cardinality, spec.optional)
                .await?
            {
                ResolveOneOutcome::Ready(artifacts) => resolved.push(ResolvedInput {
                    name: name.to_string(),
                    artifacts,
                }),
                ResolveOneOutcome::NotReady => {
                    return Ok(ResolutionResult::NotReady {
                        missing_channel: name.to_string(),
                    })
                }
                ResolveOneOutcome::Error(message) => {
                    return Ok(ResolutionResult::Error {
                        missing_channel: name.to_string(),
                        message,
                    })
                }
            }
        }
        Ok(ResolutionResult::Resolved(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::metadata_store::{schema, SqliteMetadataStore};
    use sqlx::SqlitePool;
    use sync_pipeline_domain::ir::InputSpec;
    use sync_pipeline_domain::store::{Context, Execution};
    use sync_pipeline_domain::value_objects::NodeUid;

    async fn store() -> SqliteMetadataStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        SqliteMetadataStore::new(pool)
    }

    #[tokio::test]
    async fn upstream_channel_not_ready_when_producer_never_ran() {
        let resolver = ChannelInputResolver::new(store().await);
        let mut inputs = NodeInputs::new();
        inputs.insert(
            "examples",
            InputSpec {
                channel: InputChannel::Upstream {
                    producer_node: NodeUid::new("p", "Gen"),
                    output_key: "examples".to_string(),
                },
                cardinality: InputCardinality::List,
                optional: false,
            },
        );

        let result = resolver.resolve(&inputs).await.unwrap();
        assert!(matches!(result, ResolutionResult::NotReady { .. }));
    }

    #[tokio::test]
    async fn upstream_channel_resolves_latest_successful_outputs() {
        let store_handle = store().await;
        let context = store_handle
            .get_or_create_context(Context::new(ContextType::Node, "p.Gen"))
            .await
            .unwrap();
        let execution = store_handle
            .create_execution(
                Execution::new("Gen", chrono::Utc::now()),
                &[context.id.unwrap()],
            )
            .await
            .unwrap();
        store_handle
            .update_execution_state(execution.id.unwrap(), ExecutionState::Complete, None)
            .await
            .unwrap();
        let artifact = store_handle
            .create_artifact(Artifact::new("Examples", "/tmp/examples"))
            .await
            .unwrap();
        store_handle
            .record_event(execution.id.unwrap(), artifact.id.unwrap(), "examples", false)
            .await
            .unwrap();

        let resolver = ChannelInputResolver::new(store_handle);
        let mut inputs = NodeInputs::new();
        inputs.insert(
            "examples",
            InputSpec {
                channel: InputChannel::Upstream {
                    producer_node: NodeUid::new("p", "Gen"),
                    output_key: "examples".to_string(),
                },
                cardinality: InputCardinality::List,
                optional: false,
            },
        );

        let result = resolver.resolve(&inputs).await.unwrap();
        match result {
            ResolutionResult::Resolved(resolved) => {
                assert_eq!(resolved.len(), 1);
                assert_eq!(resolved[0].artifacts.len(), 1);
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn external_channel_to_missing_context_is_a_resolution_error() {
        let resolver = ChannelInputResolver::new(store().await);
        let mut inputs = NodeInputs::new();
        inputs.insert(
            "schema",
            InputSpec {
                channel: InputChannel::External {
                    query: "never-created".to_string(),
                },
                cardinality: InputCardinality::Single,
                optional: false,
            },
        );

        let result = resolver.resolve(&inputs).await.unwrap();
        assert!(matches!(result, ResolutionResult::Error { .. }));
    }

    #[tokio::test]
    async fn optional_channel_resolves_empty_when_missing() {
        let resolver = ChannelInputResolver::new(store().await);
        let mut inputs = NodeInputs::new();
        inputs.insert(
            "schema",
            InputSpec {
                channel: InputChannel::Upstream {
                    producer_node: NodeUid::new("p", "SchemaGen"),
                    output_key: "schema".to_string(),
                },
                cardinality: InputCardinality::Single,
                optional: true,
            },
        );

        let result = resolver.resolve(&inputs).await.unwrap();
        match result {
            ResolutionResult::Resolved(resolved) => assert!(resolved[0].artifacts.is_empty()),
            other => panic!("optional channel must not block, got {other:?}"),
        }
    }
}
