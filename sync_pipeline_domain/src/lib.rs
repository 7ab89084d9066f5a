// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sync Pipeline Domain
//!
//! Pure domain layer for the synchronous pipeline orchestration core:
//! the pipeline IR, node/execution/artifact state, DAG utilities, cache
//! fingerprinting and the port traits that infrastructure implements.
//!
//! This crate has no knowledge of any concrete database, runtime or
//! transport. Everything here is plain data and trait definitions, kept
//! deliberately free of I/O so it can be exercised with fast, in-memory
//! tests regardless of how `sync_pipeline` wires up its adapters.

pub mod cache;
pub mod dag;
pub mod error;
pub mod ir;
pub mod ports;
pub mod state;
pub mod store;
pub mod task;
pub mod value_objects;

pub use error::OrchestrationError;
pub use ir::{DeploymentConfig, ExecutionMode, NodeInputs, Pipeline, PipelineNode};
pub use state::NodeState;
pub use task::Task;
pub use value_objects::{ArtifactId, ContextId, ExecutionId, NodeUid, PipelineUid};
