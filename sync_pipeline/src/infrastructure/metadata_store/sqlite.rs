// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementation of `MetadataStoreHandle`: the durable
//! counterpart of MLMD this crate actually runs against. Only the
//! fields the scheduler reads and writes are modeled; see
//! `migrations/0001_metadata_store.sql` for the schema.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ports::MetadataStoreHandle;
use sync_pipeline_domain::store::{Artifact, ArtifactState, Context, ContextType, Execution, ExecutionState};
use sync_pipeline_domain::value_objects::{ArtifactId, ContextId, ExecutionId, Status, StatusCode};

fn store_err(action: &str, err: sqlx::Error) -> OrchestrationError {
    OrchestrationError::Store(format!("{action}: {err}"))
}

fn context_type_name(t: ContextType) -> &'static str {
    t.type_name()
}

fn context_type_from_str(s: &str) -> Result<ContextType, OrchestrationError> {
    match s {
        "pipeline" => Ok(ContextType::Pipeline),
        "pipeline_run" => Ok(ContextType::PipelineRun),
        "node" => Ok(ContextType::Node),
        other => Err(OrchestrationError::Store(format!("unknown context_type {other}"))),
    }
}

fn execution_state_name(s: ExecutionState) -> &'static str {
    match s {
        ExecutionState::New => "new",
        ExecutionState::Running => "running",
        ExecutionState::Complete => "complete",
        ExecutionState::Failed => "failed",
        ExecutionState::Cancelled => "cancelled",
        ExecutionState::CacheHit => "cache_hit",
    }
}

fn execution_state_from_str(s: &str) -> Result<ExecutionState, OrchestrationError> {
    match s {
        "new" => Ok(ExecutionState::New),
        "running" => Ok(ExecutionState::Running),
        "complete" => Ok(ExecutionState::Complete),
        "failed" => Ok(ExecutionState::Failed),
        "cancelled" => Ok(ExecutionState::Cancelled),
        "cache_hit" => Ok(ExecutionState::CacheHit),
        other => Err(OrchestrationError::Store(format!("unknown execution state {other}"))),
    }
}

fn artifact_state_name(s: ArtifactState) -> &'static str {
    match s {
        ArtifactState::Pending => "pending",
        ArtifactState::Live => "live",
        ArtifactState::Deleted => "deleted",
        ArtifactState::MarkedForDeletion => "marked_for_deletion",
        ArtifactState::Abandoned => "abandoned",
    }
}

fn artifact_state_from_str(s: &str) -> Result<ArtifactState, OrchestrationError> {
    match s {
        "pending" => Ok(ArtifactState::Pending),
        "live" => Ok(ArtifactState::Live),
        "deleted" => Ok(ArtifactState::Deleted),
        "marked_for_deletion" => Ok(ArtifactState::MarkedForDeletion),
        "abandoned" => Ok(ArtifactState::Abandoned),
        other => Err(OrchestrationError::Store(format!("unknown artifact state {other}"))),
    }
}

fn status_code_name(c: StatusCode) -> &'static str {
    match c {
        StatusCode::Ok => "ok",
        StatusCode::Cancelled => "cancelled",
        StatusCode::Aborted => "aborted",
        StatusCode::DeadlineExceeded => "deadline_exceeded",
        StatusCode::Unknown => "unknown",
    }
}

fn status_code_from_str(s: &str) -> StatusCode {
    match s {
        "ok" => StatusCode::Ok,
        "cancelled" => StatusCode::Cancelled,
        "aborted" => StatusCode::Aborted,
        "deadline_exceeded" => StatusCode::DeadlineExceeded,
        _ => StatusCode::Unknown,
    }
}

fn properties_to_json(props: &BTreeMap<String, Value>) -> String {
    serde_json::to_string(props).unwrap_or_else(|_| "{}".to_string())
}

fn properties_from_json(raw: &str) -> BTreeMap<String, Value> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// `MetadataStoreHandle` backed by a local SQLite database via `sqlx`.
///
/// Cheap to clone: `SqlitePool` is an `Arc`-backed connection pool, so
/// every clone shares the same underlying connections. This lets the
/// application layer hand the same store to the cache engine, the
/// input resolver and the task generator without wrapping it in an
/// `Arc` itself.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_context(row: &sqlx::sqlite::SqliteRow) -> Result<Context, OrchestrationError> {
        let id: i64 = row.get("id");
        let context_type: String = row.get("context_type");
        let name: String = row.get("name");
        let properties: String = row.get("properties");
        Ok(Context {
            id: Some(ContextId(id)),
            context_type: context_type_from_str(&context_type)?,
            name,
            properties: properties_from_json(&properties),
        })
    }

    fn row_to_execution(row: &sqlx::sqlite::SqliteRow) -> Result<Execution, OrchestrationError> {
        let id: i64 = row.get("id");
        let node_id: String = row.get("node_id");
        let state: String = row.get("state");
        let create_time: String = row.get("create_time");
        let last_known_state_time: String = row.get("last_known_state_time");
        let status_code: Option<String> = row.get("status_code");
        let status_message: Option<String> = row.get("status_message");

        let status = status_code.map(|code| Status {
            code: status_code_from_str(&code),
            message: status_message.unwrap_or_default(),
        });

        Ok(Execution {
            id: Some(ExecutionId(id)),
            node_id,
            state: execution_state_from_str(&state)?,
            create_time: parse_time(&create_time)?,
            last_known_state_time: parse_time(&last_known_state_time)?,
            status,
        })
    }

    fn row_to_artifact(row: &sqlx::sqlite::SqliteRow) -> Result<Artifact, OrchestrationError> {
        let id: i64 = row.get("id");
        let type_name: String = row.get("type_name");
        let uri: String = row.get("uri");
        let state: String = row.get("state");
        let properties: String = row.get("properties");
        Ok(Artifact {
            id: Some(ArtifactId(id)),
            type_name,
            uri,
            state: artifact_state_from_str(&state)?,
            properties: properties_from_json(&properties),
        })
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, OrchestrationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| OrchestrationError::Store(format!("invalid timestamp {raw}: {e}")))
}

#[async_trait]
impl MetadataStoreHandle for SqliteMetadataStore {
    async fn get_or_create_context(&self, context: Context) -> Result<Context, OrchestrationError> {
        if let Some(existing) = self
            .get_context(context.context_type, &context.name)
            .await?
        {
            return Ok(existing);
        }

        let type_name = context_type_name(context.context_type);
        let properties = properties_to_json(&context.properties);

        let result = sqlx::query(
            "INSERT OR IGNORE INTO contexts (context_type, name, properties) VALUES (?, ?, ?)",
        )
        .bind(type_name)
        .bind(&context.name)
        .bind(&properties)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("insert context", e))?;

        let id = if result.rows_affected() == 1 {
            result.last_insert_rowid()
        } else {
            // Lost the creation race; the row already exists.
            let row = sqlx::query("SELECT id FROM contexts WHERE context_type = ? AND name = ?")
                .bind(type_name)
                .bind(&context.name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| store_err("reselect context", e))?;
            row.get("id")
        };

        Ok(Context {
            id: Some(ContextId(id)),
            ..context
        })
    }

    async fn get_context(
        &self,
        context_type: ContextType,
        name: &str,
    ) -> Result<Option<Context>, OrchestrationError> {
        let row = sqlx::query("SELECT id, context_type, name, properties FROM contexts WHERE context_type = ? AND name = ?")
            .bind(context_type_name(context_type))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("select context", e))?;

        row.as_ref().map(Self::row_to_context).transpose()
    }

    async fn put_parent_context(&self, parent: ContextId, child: ContextId) -> Result<(), OrchestrationError> {
        sqlx::query("INSERT OR IGNORE INTO parent_contexts (parent_id, child_id) VALUES (?, ?)")
            .bind(parent.0)
            .bind(child.0)
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("insert parent context", e))?;
        Ok(())
    }

    async fn parent_contexts(&self, child: ContextId) -> Result<Vec<Context>, OrchestrationError> {
        let rows = sqlx::query(
            "SELECT c.id, c.context_type, c.name, c.properties FROM contexts c \
             JOIN parent_contexts pc ON pc.parent_id = c.id \
             WHERE pc.child_id = ?",
        )
        .bind(child.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("select parent contexts", e))?;

        rows.iter().map(Self::row_to_context).collect()
    }

    async fn create_execution(
        &self,
        execution: Execution,
        contexts: &[ContextId],
    ) -> Result<Execution, OrchestrationError> {
        let status_code = execution.status.as_ref().map(|s| status_code_name(s.code));
        let status_message = execution.status.as_ref().map(|s| s.message.clone());

        let result = sqlx::query(
            "INSERT INTO executions (node_id, state, create_time, last_known_state_time, status_code, status_message) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&execution.node_id)
        .bind(execution_state_name(execution.state))
        .bind(execution.create_time.to_rfc3339())
        .bind(execution.last_known_state_time.to_rfc3339())
        .bind(status_code)
        .bind(status_message)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("insert execution", e))?;

        let id = ExecutionId(result.last_insert_rowid());

        for context_id in contexts {
            sqlx::query("INSERT OR IGNORE INTO execution_contexts (execution_id, context_id) VALUES (?, ?)")
                .bind(id.0)
                .bind(context_id.0)
                .execute(&self.pool)
                .await
                .map_err(|e| store_err("link execution context", e))?;
        }

        Ok(Execution {
            id: Some(id),
            ..execution
        })
    }

    async fn update_execution_state(
        &self,
        execution_id: ExecutionId,
        state: ExecutionState,
        error_message: Option<String>,
    ) -> Result<(), OrchestrationError> {
        let now = Utc::now().to_rfc3339();
        let status_code = error_message.as_ref().map(|_| status_code_name(StatusCode::Unknown));

        sqlx::query(
            "UPDATE executions SET state = ?, last_known_state_time = ?, status_code = COALESCE(?, status_code), \
             status_message = COALESCE(?, status_message) WHERE id = ?",
        )
        .bind(execution_state_name(state))
        .bind(now)
        .bind(status_code)
        .bind(error_message)
        .bind(execution_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("update execution state", e))?;
        Ok(())
    }

    async fn get_execution(&self, execution_id: ExecutionId) -> Result<Option<Execution>, OrchestrationError> {
        let row = sqlx::query(
            "SELECT id, node_id, state, create_time, last_known_state_time, status_code, status_message \
             FROM executions WHERE id = ?",
        )
        .bind(execution_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("select execution", e))?;

        row.as_ref().map(Self::row_to_execution).transpose()
    }

    async fn get_executions_for_context(&self, context_id: ContextId) -> Result<Vec<Execution>, OrchestrationError> {
        let rows = sqlx::query(
            "SELECT e.id, e.node_id, e.state, e.create_time, e.last_known_state_time, e.status_code, e.status_message \
             FROM executions e \
             JOIN execution_contexts ec ON ec.execution_id = e.id \
             WHERE ec.context_id = ? \
             ORDER BY e.id DESC",
        )
        .bind(context_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("select executions for context", e))?;

        rows.iter().map(Self::row_to_execution).collect()
    }

    async fn create_artifact(&self, artifact: Artifact) -> Result<Artifact, OrchestrationError> {
        let properties = properties_to_json(&artifact.properties);
        let result = sqlx::query("INSERT INTO artifacts (type_name, uri, state, properties) VALUES (?, ?, ?, ?)")
            .bind(&artifact.type_name)
            .bind(&artifact.uri)
            .bind(artifact_state_name(artifact.state))
            .bind(&properties)
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("insert artifact", e))?;

        Ok(Artifact {
            id: Some(ArtifactId(result.last_insert_rowid())),
            ..artifact
        })
    }

    async fn get_artifacts_by_ids(&self, ids: &[ArtifactId]) -> Result<Vec<Artifact>, OrchestrationError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let query = format!(
            "SELECT id, type_name, uri, state, properties FROM artifacts WHERE id IN ({placeholders})"
        );
        let mut q = sqlx::query(&query);
        for id in ids {
            q = q.bind(id.0);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_err("select artifacts by id", e))?;

        rows.iter().map(Self::row_to_artifact).collect()
    }

    async fn record_event(
        &self,
        execution_id: ExecutionId,
        artifact_id: ArtifactId,
        channel_name: &str,
        is_input: bool,
    ) -> Result<(), OrchestrationError> {
        sqlx::query(
            "INSERT OR IGNORE INTO events (execution_id, artifact_id, channel_name, is_input) VALUES (?, ?, ?, ?)",
        )
        .bind(execution_id.0)
        .bind(artifact_id.0)
        .bind(channel_name)
        .bind(is_input as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("record event", e))?;
        Ok(())
    }

    async fn output_artifacts_of(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<(String, Artifact)>, OrchestrationError> {
        let rows = sqlx::query(
            "SELECT a.id, a.type_name, a.uri, a.state, a.properties, ev.channel_name \
             FROM artifacts a \
             JOIN events ev ON ev.artifact_id = a.id \
             WHERE ev.execution_id = ? AND ev.is_input = 0",
        )
        .bind(execution_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("select output artifacts", e))?;

        rows.iter()
            .map(|row| {
                let artifact = Self::row_to_artifact(row)?;
                let channel_name: String = row.get("channel_name");
                Ok((channel_name, artifact))
            })
            .collect()
    }

    async fn input_artifacts_of(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<(String, Artifact)>, OrchestrationError> {
        let rows = sqlx::query(
            "SELECT a.id, a.type_name, a.uri, a.state, a.properties, ev.channel_name \
             FROM artifacts a \
             JOIN events ev ON ev.artifact_id = a.id \
             WHERE ev.execution_id = ? AND ev.is_input = 1",
        )
        .bind(execution_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("select input artifacts", e))?;

        rows.iter()
            .map(|row| {
                let artifact = Self::row_to_artifact(row)?;
                let channel_name: String = row.get("channel_name");
                Ok((channel_name, artifact))
            })
            .collect()
    }

    async fn list_contexts_by_type(&self, context_type: ContextType) -> Result<Vec<Context>, OrchestrationError> {
        let rows = sqlx::query(
            "SELECT id, context_type, name, properties FROM contexts WHERE context_type = ? ORDER BY id DESC",
        )
        .bind(context_type_name(context_type))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("select contexts by type", e))?;

        rows.iter().map(Self::row_to_context).collect()
    }

    async fn get_executions_associated_with_all_contexts(
        &self,
        contexts: &[ContextId],
    ) -> Result<Vec<Execution>, OrchestrationError> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }

        let having = format!("HAVING COUNT(DISTINCT ec.context_id) = {}", contexts.len());
        let placeholders = contexts.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let query = format!(
            "SELECT e.id, e.node_id, e.state, e.create_time, e.last_known_state_time, e.status_code, e.status_message \
             FROM executions e \
             JOIN execution_contexts ec ON ec.execution_id = e.id \
             WHERE ec.context_id IN ({placeholders}) \
             GROUP BY e.id \
             {having} \
             ORDER BY e.id DESC"
        );

        let mut q = sqlx::query(&query);
        for context_id in contexts {
            q = q.bind(context_id.0);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_err("select executions associated with contexts", e))?;

        rows.iter().map(Self::row_to_execution).collect()
    }
}
