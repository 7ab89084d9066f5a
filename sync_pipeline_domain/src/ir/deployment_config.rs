// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Deployment-time configuration attached to a pipeline IR: per-node
//! executor specs and platform configs, keyed by node id. Kept opaque
//! (`serde_json::Value`) at this layer since the orchestrator core never
//! interprets these payloads, only filters them to match a partial-run
//! node set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub executor_specs: IndexMap<String, Value>,
    pub custom_driver_specs: IndexMap<String, Value>,
    pub node_level_platform_configs: IndexMap<String, Value>,
    /// Non-node-keyed global config, passed through untouched.
    pub metadata_connection_config: Option<Value>,
}

impl DeploymentConfig {
    /// Keep only the entries whose node id is in `keep`, matching the
    /// shrinking done to the rest of the IR during a partial run.
    pub fn filtered_to(&self, keep: impl Fn(&str) -> bool) -> Self {
        let filter = |m: &IndexMap<String, Value>| -> IndexMap<String, Value> {
            m.iter()
                .filter(|(k, _)| keep(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        Self {
            executor_specs: filter(&self.executor_specs),
            custom_driver_specs: filter(&self.custom_driver_specs),
            node_level_platform_configs: filter(&self.node_level_platform_configs),
            metadata_connection_config: self.metadata_connection_config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_to_drops_entries_outside_the_keep_set() {
        let mut cfg = DeploymentConfig::default();
        cfg.executor_specs
            .insert("A".to_string(), Value::String("a".into()));
        cfg.executor_specs
            .insert("B".to_string(), Value::String("b".into()));

        let filtered = cfg.filtered_to(|id| id == "A");
        assert!(filtered.executor_specs.contains_key("A"));
        assert!(!filtered.executor_specs.contains_key("B"));
    }
}
