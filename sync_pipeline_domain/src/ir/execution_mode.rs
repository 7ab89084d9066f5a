// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// A pipeline's execution mode. Only `Sync` is schedulable by this engine;
/// an IR carrying any other mode is rejected at `Pipeline::validate` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Sync,
    Async,
}
