// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Bootstrap-phase configuration structure.
//!
//! `AppConfig` holds **validated** configuration after:
//! 1. Command-line argument parsing
//! 2. Security validation
//! 3. Environment variable resolution
//! 4. Default value application
//!
//! All configuration is immutable after creation, so it can be shared
//! across async tasks without synchronization.

use std::path::PathBuf;

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Application configuration.
///
/// Immutable configuration structure holding all bootstrap-phase settings
/// for the orchestration engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    app_name: String,
    log_level: LogLevel,
    /// Path to the TOML configuration file, if one was supplied.
    config_path: Option<PathBuf>,
    /// Path to the SQLite metadata store database file.
    metadata_db_path: PathBuf,
    /// Number of tokio runtime worker threads (`None` = automatic).
    runtime_worker_threads: Option<usize>,
    verbose: bool,
    /// When true, ticks compute and log their task decisions without
    /// writing them to the metadata store or invoking side effects.
    dry_run: bool,
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn metadata_db_path(&self) -> &PathBuf {
        &self.metadata_db_path
    }

    pub fn runtime_worker_threads(&self) -> Option<usize> {
        self.runtime_worker_threads
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    app_name: Option<String>,
    log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
    metadata_db_path: Option<PathBuf>,
    runtime_worker_threads: Option<usize>,
    verbose: bool,
    dry_run: bool,
}

impl AppConfigBuilder {
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn metadata_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_db_path = Some(path.into());
        self
    }

    pub fn runtime_worker_threads(mut self, count: usize) -> Self {
        self.runtime_worker_threads = Some(count);
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    ///
    /// Panics if `app_name` or `metadata_db_path` was not set.
    pub fn build(self) -> AppConfig {
        AppConfig {
            app_name: self.app_name.expect("app_name is required"),
            log_level: self.log_level.unwrap_or_default(),
            config_path: self.config_path,
            metadata_db_path: self.metadata_db_path.expect("metadata_db_path is required"),
            runtime_worker_threads: self.runtime_worker_threads,
            verbose: self.verbose,
            dry_run: self.dry_run,
        }
    }

    pub fn try_build(self) -> Result<AppConfig, String> {
        Ok(AppConfig {
            app_name: self.app_name.ok_or("app_name is required")?,
            log_level: self.log_level.unwrap_or_default(),
            config_path: self.config_path,
            metadata_db_path: self.metadata_db_path.ok_or("metadata_db_path is required")?,
            runtime_worker_threads: self.runtime_worker_threads,
            verbose: self.verbose,
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_minimal_applies_defaults() {
        let config = AppConfig::builder()
            .app_name("sync-pipeline")
            .metadata_db_path("/tmp/metadata.db")
            .build();

        assert_eq!(config.app_name(), "sync-pipeline");
        assert_eq!(config.log_level(), LogLevel::Info);
        assert!(config.config_path().is_none());
        assert!(config.runtime_worker_threads().is_none());
        assert!(!config.is_verbose());
        assert!(!config.is_dry_run());
    }

    #[test]
    fn builder_full_round_trips_every_field() {
        let config = AppConfig::builder()
            .app_name("sync-pipeline")
            .log_level(LogLevel::Debug)
            .config_path("/etc/sync-pipeline.toml")
            .metadata_db_path("/var/lib/sync-pipeline/metadata.db")
            .runtime_worker_threads(4)
            .verbose(true)
            .dry_run(true)
            .build();

        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.runtime_worker_threads(), Some(4));
        assert!(config.is_verbose());
        assert!(config.is_dry_run());
    }

    #[test]
    #[should_panic(expected = "app_name is required")]
    fn build_panics_without_app_name() {
        AppConfig::builder().metadata_db_path("/tmp/x.db").build();
    }

    #[test]
    fn try_build_reports_missing_fields() {
        let result = AppConfig::builder().app_name("x").try_build();
        assert_eq!(result.unwrap_err(), "metadata_db_path is required");
    }
}
