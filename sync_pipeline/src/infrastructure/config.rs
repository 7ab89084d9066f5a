// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Engine-level configuration: where the metadata store lives, how big
//! the successful-nodes cache is, and how often the demo driver polls.
//! Loaded from an optional TOML file layered under environment
//! overrides, mirroring the teacher's config-crate layering.

use serde::Deserialize;

/// Validated, immutable engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// `sqlx` connection string for the metadata store, e.g.
    /// `sqlite://metadata.db` or `sqlite::memory:`.
    pub database_url: String,
    /// Capacity of the in-process successful-nodes cache.
    pub successful_nodes_cache_capacity: usize,
    /// Poll interval, in milliseconds, the demo driver sleeps between
    /// ticks when run in a loop rather than invoked once.
    pub tick_poll_interval_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            successful_nodes_cache_capacity: 1024,
            tick_poll_interval_ms: 1_000,
        }
    }
}

impl OrchestratorConfig {
    /// Loads configuration from (in ascending priority) built-in
    /// defaults, an optional `config_path` TOML file, and `SYNC_PIPELINE_*`
    /// environment variables (e.g. `SYNC_PIPELINE_DATABASE_URL`).
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let defaults = OrchestratorConfig::default();
        let mut builder = config::Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default(
                "successful_nodes_cache_capacity",
                defaults.successful_nodes_cache_capacity as i64,
            )?
            .set_default("tick_poll_interval_ms", defaults.tick_poll_interval_ms as i64)?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(config::Environment::with_prefix("SYNC_PIPELINE"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_with_no_file_or_env() {
        let config = OrchestratorConfig::load(None).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.successful_nodes_cache_capacity, 1024);
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let config = OrchestratorConfig::load(Some("/nonexistent/path/does-not-exist")).unwrap();
        assert_eq!(config.tick_poll_interval_ms, 1_000);
    }
}
