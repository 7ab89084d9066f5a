// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cache fingerprinting: a stable identity for "this node, given these
//! exact resolved inputs and this executor spec, has already run
//! successfully".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::Artifact;
use crate::value_objects::NodeUid;

/// A 32-byte SHA-256 digest, hex-encoded for display and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheFingerprint([u8; 32]);

impl CacheFingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for CacheFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// The pieces of a node's identity that determine whether a prior
/// execution's outputs can be reused: which pipeline and node, resolved
/// input artifacts (by id, since identical uris with different ids are
/// different provenance), the declared output shape, the node's static
/// parameters, and the executor spec that would run it.
#[derive(Serialize)]
struct FingerprintKey<'a> {
    pipeline_name: &'a str,
    node_uid: &'a NodeUid,
    input_artifact_ids: Vec<(String, Vec<i64>)>,
    output_specs: Vec<(String, String)>,
    parameters: &'a BTreeMap<String, serde_json::Value>,
    executor_spec: &'a serde_json::Value,
}

/// Computes a deterministic fingerprint over a node's identity, its
/// resolved inputs (by artifact id, name-sorted for channel-order
/// independence), its declared output shape, its static parameters and
/// its executor spec. Two calls with equal arguments always produce equal
/// fingerprints, and canonical JSON serialization keeps the fingerprint
/// stable across process restarts.
///
/// Deliberately keyed on `pipeline_name`, not the full pipeline run id:
/// a cache entry from one run of a pipeline should be reusable by a later
/// run of the same pipeline, not just within the run that created it.
pub fn compute_fingerprint(
    pipeline_name: &str,
    node_uid: &NodeUid,
    resolved_inputs: &[(String, Vec<Artifact>)],
    output_specs: &[(String, String)],
    parameters: &BTreeMap<String, serde_json::Value>,
    executor_spec: &serde_json::Value,
) -> CacheFingerprint {
    let mut input_artifact_ids: Vec<(String, Vec<i64>)> = resolved_inputs
        .iter()
        .map(|(name, artifacts)| {
            (
                name.clone(),
                artifacts.iter().filter_map(|a| a.id.map(|id| id.0)).collect(),
            )
        })
        .collect();
    input_artifact_ids.sort_by(|a, b| a.0.cmp(&b.0));

    let mut output_specs: Vec<(String, String)> = output_specs.to_vec();
    output_specs.sort_by(|a, b| a.0.cmp(&b.0));

    let key = FingerprintKey {
        pipeline_name,
        node_uid,
        input_artifact_ids,
        output_specs,
        parameters,
        executor_spec,
    };
    let canonical = serde_json::to_vec(&key).expect("fingerprint key is always serializable");

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    CacheFingerprint(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let node_uid = NodeUid::new("p", "Trainer");
        let spec = serde_json::json!({"class": "Trainer"});
        let f1 = compute_fingerprint("p", &node_uid, &[], &[], &params(), &spec);
        let f2 = compute_fingerprint("p", &node_uid, &[], &[], &params(), &spec);
        assert_eq!(f1, f2);
    }

    #[test]
    fn fingerprint_changes_with_inputs() {
        let node_uid = NodeUid::new("p", "Trainer");
        let spec = serde_json::json!({"class": "Trainer"});
        let mut artifact = Artifact::new("Examples", "/tmp/a");
        artifact.id = Some(crate::value_objects::ArtifactId(1));
        let f1 = compute_fingerprint("p", &node_uid, &[], &[], &params(), &spec);
        let f2 = compute_fingerprint(
            "p",
            &node_uid,
            &[("examples".to_string(), vec![artifact])],
            &[],
            &params(),
            &spec,
        );
        assert_ne!(f1, f2);
    }

    #[test]
    fn fingerprint_changes_with_pipeline_name() {
        let node_uid = NodeUid::new("p", "Trainer");
        let spec = serde_json::json!({});
        let f1 = compute_fingerprint("p", &node_uid, &[], &[], &params(), &spec);
        let f2 = compute_fingerprint("q", &node_uid, &[], &[], &params(), &spec);
        assert_ne!(f1, f2);
    }

    #[test]
    fn fingerprint_changes_with_output_specs() {
        let node_uid = NodeUid::new("p", "Trainer");
        let spec = serde_json::json!({});
        let f1 = compute_fingerprint("p", &node_uid, &[], &[], &params(), &spec);
        let f2 = compute_fingerprint(
            "p",
            &node_uid,
            &[],
            &[("model".to_string(), "Model".to_string())],
            &params(),
            &spec,
        );
        assert_ne!(f1, f2);
    }

    #[test]
    fn fingerprint_changes_with_parameters() {
        let node_uid = NodeUid::new("p", "Trainer");
        let spec = serde_json::json!({});
        let mut with_params = BTreeMap::new();
        with_params.insert("epochs".to_string(), serde_json::json!(10));
        let f1 = compute_fingerprint("p", &node_uid, &[], &[], &params(), &spec);
        let f2 = compute_fingerprint("p", &node_uid, &[], &[], &with_params, &spec);
        assert_ne!(f1, f2);
    }

    #[test]
    fn fingerprint_is_channel_order_independent() {
        let node_uid = NodeUid::new("p", "Trainer");
        let spec = serde_json::json!({});
        let mut a1 = Artifact::new("A", "/tmp/a");
        a1.id = Some(crate::value_objects::ArtifactId(1));
        let mut a2 = Artifact::new("B", "/tmp/b");
        a2.id = Some(crate::value_objects::ArtifactId(2));

        let f1 = compute_fingerprint(
            "p",
            &node_uid,
            &[
                ("a".to_string(), vec![a1.clone()]),
                ("b".to_string(), vec![a2.clone()]),
            ],
            &[
                ("out_a".to_string(), "A".to_string()),
                ("out_b".to_string(), "B".to_string()),
            ],
            &params(),
            &spec,
        );
        let f2 = compute_fingerprint(
            "p",
            &node_uid,
            &[("b".to_string(), vec![a2]), ("a".to_string(), vec![a1])],
            &[
                ("out_b".to_string(), "B".to_string()),
                ("out_a".to_string(), "A".to_string()),
            ],
            &params(),
            &spec,
        );
        assert_eq!(f1, f2);
    }
}
