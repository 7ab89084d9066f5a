// /////////////////////////////////////////////////////////////////////////////
// Sync Pipeline Orchestrator
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Partial-run marking: rewrites a pipeline IR in place so that only a
//! requested sub-DAG runs, with every node outside that sub-DAG marked
//! to have its prior outputs recycled instead.
//!
//! Unlike the original core's node model - which carries explicit
//! `upstream_node_ids`/`downstream_node_ids` lists that get pruned at
//! the boundary of the kept subgraph - this crate's [`PipelineNode`]
//! derives its upstream edges from its own `inputs`. There is nothing to
//! prune on the IR side: every node stays in the pipeline, and only its
//! `execution_options.partial_run` marking changes. The generator reads
//! that marking (a future extension point; today every node is
//! scheduled, so a caller wanting to *skip* unmarked nodes layers that
//! check on top) and the artifact recycler reads it to decide which
//! nodes' outputs to carry forward.

use indexmap::IndexSet;

use sync_pipeline_domain::dag::{self, TraverseDirection};
use sync_pipeline_domain::error::OrchestrationError;
use sync_pipeline_domain::ir::{ChiefSettings, DeploymentConfig, Pipeline, PartialRunOption};

/// Marks `pipeline` in place for a partial run: nodes reachable
/// downstream of `from` and upstream of `to` are marked to run (the
/// first, in IR order, additionally becomes chief); every other node is
/// marked skip, flagged `reuse_artifacts` when a kept node depends on it
/// directly.
///
/// Mirrors `partial_run_utils.mark_pipeline`'s `to_keep` computation:
/// `downstream_reachable(from) ∩ upstream_reachable(to)`.
pub fn mark_pipeline(
    pipeline: &mut Pipeline,
    from: impl Fn(&str) -> bool,
    to: impl Fn(&str) -> bool,
    chief_settings: ChiefSettings,
) -> Result<(), OrchestrationError> {
    pipeline.validate()?;

    let node_upstream = dag::ordered_node_map(pipeline);

    let from_ids: Vec<String> = node_upstream
        .keys()
        .filter(|id| from(id))
        .cloned()
        .collect();
    let to_ids: Vec<String> = node_upstream.keys().filter(|id| to(id)).cloned().collect();

    let downstream_of_from = dag::traverse(&node_upstream, &from_ids, TraverseDirection::Downstream);
    let upstream_of_to = dag::traverse(&node_upstream, &to_ids, TraverseDirection::Upstream);
    let to_keep: IndexSet<String> = downstream_of_from
        .intersection(&upstream_of_to)
        .cloned()
        .collect();

    // Any node outside `to_keep` that a kept node depends on directly is
    // an "excluded direct dependency": its outputs must be recycled
    // forward, since nothing will regenerate them this run.
    let mut excluded_direct_dependencies: IndexSet<String> = IndexSet::new();
    for node_id in &to_keep {
        for upstream_id in node_upstream.get(node_id.as_str()).into_iter().flatten() {
            if !to_keep.contains(upstream_id) {
                excluded_direct_dependencies.insert(upstream_id.clone());
            }
        }
    }

    let mut chief_assigned = false;
    let node_ids: Vec<String> = node_upstream.keys().cloned().collect();
    for node_id in node_ids {
        let option = if to_keep.contains(&node_id) {
            let chief = if chief_assigned {
                None
            } else {
                chief_assigned = true;
                Some(chief_settings.clone())
            };
            PartialRunOption::Run { chief }
        } else {
            PartialRunOption::Skip {
                reuse_artifacts: excluded_direct_dependencies.contains(&node_id),
            }
        };
        pipeline.set_partial_run_option(&node_id, option);
    }

    Ok(())
}

/// Restricts a deployment config to the nodes that will actually run in
/// a marked pipeline, the way `_fix_deployment_config` trims
/// `DeploymentConfig.executor_specs`/`custom_driver_specs`/
/// `node_level_platform_configs` to the kept node set. Skip nodes never
/// reach an executor, so their specs would otherwise dangle.
pub fn filter_deployment_config(pipeline: &Pipeline) -> DeploymentConfig {
    pipeline.deployment_config.filtered_to(|node_id| {
        pipeline
            .node(node_id)
            .map(|node| matches!(node.options.partial_run, PartialRunOption::Run { .. }))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_pipeline_domain::ir::{
        InputCardinality, InputChannel, InputSpec, NodeExecutionOptions, NodeInputs, PipelineNode,
    };
    use sync_pipeline_domain::ir::ExecutionMode;
    use sync_pipeline_domain::value_objects::{NodeUid, PipelineUid};

    fn node(id: &str, upstream: Option<&str>) -> PipelineNode {
        let mut inputs = NodeInputs::new();
        if let Some(upstream) = upstream {
            inputs.insert(
                "in",
                InputSpec {
                    channel: InputChannel::Upstream {
                        producer_node: NodeUid::new("p", upstream),
                        output_key: "out".to_string(),
                    },
                    cardinality: InputCardinality::List,
                    optional: false,
                },
            );
        }
        PipelineNode::new(id, inputs, NodeExecutionOptions::default())
    }

    fn linear_abc() -> Pipeline {
        Pipeline::new(
            PipelineUid::new("p", None),
            ExecutionMode::Sync,
            false,
            DeploymentConfig::default(),
            vec![node("A", None), node("B", Some("A")), node("C", Some("B"))],
        )
        .unwrap()
    }

    #[test]
    fn from_b_to_c_keeps_only_b_and_c() {
        let mut pipeline = linear_abc();
        mark_pipeline(
            &mut pipeline,
            |id| id == "B",
            |id| id == "C",
            ChiefSettings::LatestPipelineRun,
        )
        .unwrap();

        assert!(matches!(
            pipeline.node("A").unwrap().options.partial_run,
            PartialRunOption::Skip { reuse_artifacts: true }
        ));
        assert!(matches!(
            pipeline.node("B").unwrap().options.partial_run,
            PartialRunOption::Run { chief: Some(_) }
        ));
        assert!(matches!(
            pipeline.node("C").unwrap().options.partial_run,
            PartialRunOption::Run { chief: None }
        ));
    }

    #[test]
    fn exactly_one_chief_when_to_keep_is_nonempty() {
        let mut pipeline = linear_abc();
        mark_pipeline(
            &mut pipeline,
            |_| true,
            |_| true,
            ChiefSettings::LatestPipelineRun,
        )
        .unwrap();

        let chiefs = pipeline
            .nodes()
            .filter(|n| matches!(n.options.partial_run, PartialRunOption::Run { chief: Some(_) }))
            .count();
        assert_eq!(chiefs, 1);
    }

    #[test]
    fn unrelated_node_outside_from_to_is_skipped_without_reuse() {
        // D has no relation to A/B/C's selected window.
        let mut pipeline = Pipeline::new(
            PipelineUid::new("p", None),
            ExecutionMode::Sync,
            false,
            DeploymentConfig::default(),
            vec![node("A", None), node("B", Some("A")), node("C", Some("B")), node("D", None)],
        )
        .unwrap();
        mark_pipeline(
            &mut pipeline,
            |id| id == "B",
            |id| id == "C",
            ChiefSettings::LatestPipelineRun,
        )
        .unwrap();

        assert!(matches!(
            pipeline.node("D").unwrap().options.partial_run,
            PartialRunOption::Skip { reuse_artifacts: false }
        ));
    }

    #[test]
    fn filter_deployment_config_drops_skip_node_specs() {
        let mut pipeline = linear_abc();
        pipeline
            .deployment_config
            .executor_specs
            .insert("A".to_string(), serde_json::json!({"class": "Gen"}));
        pipeline
            .deployment_config
            .executor_specs
            .insert("B".to_string(), serde_json::json!({"class": "Trainer"}));

        mark_pipeline(
            &mut pipeline,
            |id| id == "B",
            |id| id == "C",
            ChiefSettings::LatestPipelineRun,
        )
        .unwrap();

        let filtered = filter_deployment_config(&pipeline);
        assert!(!filtered.executor_specs.contains_key("A"));
        assert!(filtered.executor_specs.contains_key("B"));
    }
}
