// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema helpers shared by the metadata-store adapter.
//!
//! Applies migrations on start-up so integration tests and the CLI see
//! a consistent database.

use sqlx::migrate::MigrateDatabase;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Runs pending migrations against the provided SQLite pool.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("ensuring metadata store schema is up to date");
    sqlx::migrate!().run(pool).await?;
    info!("metadata store schema is up to date");
    Ok(())
}

/// Creates the SQLite database file if it doesn't exist yet.
pub async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    if !sqlx::Sqlite::database_exists(database_url).await? {
        debug!(database_url, "creating metadata store database");
        sqlx::Sqlite::create_database(database_url).await?;
    }
    Ok(())
}

/// Connects to `database_url`, creating the file and applying
/// migrations if necessary. The one-stop entry point bootstrap uses to
/// get a ready-to-query pool.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_database_if_missing(database_url).await?;
    let pool = SqlitePool::connect(database_url).await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn migrations_create_the_contexts_table() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'contexts'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }
}
