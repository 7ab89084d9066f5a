// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! DAG utilities shared by the task generator, the partial-run marker
//! and the artifact recycler: an order-preserving node map, layered
//! topological sort, terminal-node detection, and closure traversal.

use indexmap::{IndexMap, IndexSet};

use crate::ir::Pipeline;

/// Direction to walk the dependency graph in `traverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraverseDirection {
    /// Follow edges from a node to the nodes that consume its outputs.
    Downstream,
    /// Follow edges from a node to the nodes that produce its inputs.
    Upstream,
}

/// A node id keyed, insertion-ordered view of the pipeline's nodes,
/// mirroring the original implementation's reliance on dict insertion
/// order to keep traversal deterministic.
pub fn ordered_node_map(pipeline: &Pipeline) -> IndexMap<String, Vec<String>> {
    pipeline
        .nodes()
        .map(|node| {
            let upstream = node
                .inputs
                .upstream_nodes()
                .into_iter()
                .filter(|uid| uid.pipeline_name() == pipeline.uid.pipeline_name())
                .map(|uid| uid.node_id().to_string())
                .collect();
            (node.node_id.clone(), upstream)
        })
        .collect()
}

/// Splits a pipeline's nodes into layers such that every node's direct
/// upstream dependencies appear in a strictly earlier layer. Layer 0
/// contains every node with no in-pipeline dependency.
///
/// Assumes the node map's iteration order is already a topological sort
/// (an IR invariant checked by `Pipeline::validate`); this function only
/// groups that order into layers, it does not re-derive the order from
/// scratch.
pub fn topsorted_layers(node_upstream: &IndexMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut layer_of: IndexMap<&str, usize> = IndexMap::new();
    let mut layers: Vec<Vec<String>> = Vec::new();

    for (node_id, upstream) in node_upstream {
        let layer = upstream
            .iter()
            .filter_map(|u| layer_of.get(u.as_str()).copied())
            .max()
            .map(|l| l + 1)
            .unwrap_or(0);

        if layers.len() <= layer {
            layers.push(Vec::new());
        }
        layers[layer].push(node_id.clone());
        layer_of.insert(node_id.as_str(), layer);
    }

    layers
}

/// The node ids with no downstream consumer within the pipeline: the
/// natural "exit points" used to decide when a run has finished absent
/// an explicit finalize node.
pub fn terminal_node_ids(node_upstream: &IndexMap<String, Vec<String>>) -> Vec<String> {
    let mut has_downstream: IndexSet<String> = IndexSet::new();
    for upstream in node_upstream.values() {
        for u in upstream {
            has_downstream.insert(u.clone());
        }
    }
    node_upstream
        .keys()
        .filter(|id| !has_downstream.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Computes the closure of `roots` in the given direction: every node
/// reachable by repeatedly following edges that way, including the
/// roots themselves.
pub fn traverse(
    node_upstream: &IndexMap<String, Vec<String>>,
    roots: &[String],
    direction: TraverseDirection,
) -> IndexSet<String> {
    let downstream_of: IndexMap<&str, Vec<&str>> = match direction {
        TraverseDirection::Upstream => IndexMap::new(),
        TraverseDirection::Downstream => {
            let mut map: IndexMap<&str, Vec<&str>> = IndexMap::new();
            for (node_id, upstream) in node_upstream {
                for u in upstream {
                    map.entry(u.as_str()).or_default().push(node_id.as_str());
                }
            }
            map
        }
    };

    let mut visited: IndexSet<String> = IndexSet::new();
    let mut stack: Vec<String> = roots.to_vec();

    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id.clone()) {
            continue;
        }
        let neighbors: Vec<String> = match direction {
            TraverseDirection::Upstream => node_upstream
                .get(node_id.as_str())
                .cloned()
                .unwrap_or_default(),
            TraverseDirection::Downstream => downstream_of
                .get(node_id.as_str())
                .map(|v| v.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        };
        for n in neighbors {
            if !visited.contains(&n) {
                stack.push(n);
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn topsorted_layers_groups_by_longest_path() {
        // A -> B -> D, A -> C -> D
        let m = map(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["A"]),
            ("D", &["B", "C"]),
        ]);
        let layers = topsorted_layers(&m);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0], vec!["A".to_string()]);
        assert_eq!(layers[1].len(), 2);
        assert_eq!(layers[2], vec!["D".to_string()]);
    }

    #[test]
    fn terminal_node_ids_finds_sinks() {
        let m = map(&[("A", &[]), ("B", &["A"]), ("C", &["A"])]);
        let mut terminals = terminal_node_ids(&m);
        terminals.sort();
        assert_eq!(terminals, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn traverse_downstream_closure_includes_root() {
        let m = map(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);
        let closure = traverse(&m, &["A".to_string()], TraverseDirection::Downstream);
        assert!(closure.contains("A"));
        assert!(closure.contains("B"));
        assert!(closure.contains("C"));
    }

    #[test]
    fn traverse_upstream_closure_stops_at_roots_with_no_parent() {
        let m = map(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);
        let closure = traverse(&m, &["C".to_string()], TraverseDirection::Upstream);
        assert_eq!(closure.len(), 3);
    }
}
