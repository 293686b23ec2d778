//! Reexecution Planner
//!
//! Turns "re-run from failure" into a concrete step set by inspecting a
//! parent run's step outcomes against the resolved pipeline's step graph.
//!
//! A step is selected when its latest outcome is FAILURE, or when it sits
//! downstream of a selected step. Successful steps outside that closure are
//! left out; reusing their outputs is the execution backend's concern.

use sluice_core::domain::execution::ReexecutionPolicy;
use sluice_core::domain::pipeline::ResolvedPipeline;
use sluice_core::domain::step::{StepOutcome, StepStatus};
use std::collections::{BTreeSet, HashMap};

use crate::error::PlanningError;
use crate::repository::RunHistoryReader;

/// Rejects every policy the planner cannot honour
pub fn check_policy(policy: ReexecutionPolicy) -> Result<(), PlanningError> {
    match policy {
        ReexecutionPolicy::FromFailure => Ok(()),
        other => Err(PlanningError::UnsupportedPolicy { policy: other }),
    }
}

/// Computes the steps to re-execute for a from-failure re-run of `parent_run_id`
pub async fn plan_from_failure<R>(
    reader: &R,
    parent_run_id: &str,
    pipeline: &ResolvedPipeline,
) -> Result<BTreeSet<String>, PlanningError>
where
    R: RunHistoryReader + ?Sized,
{
    let parent = reader
        .get_by_id(parent_run_id)
        .await?
        .ok_or_else(|| PlanningError::ParentNotFound {
            run_id: parent_run_id.to_string(),
        })?;

    let outcomes = reader.get_step_outcomes(parent_run_id).await?;
    let latest = latest_outcomes(&outcomes);

    for step_key in latest.keys().filter(|key| !pipeline.steps.contains(key)) {
        tracing::warn!(
            "Ignoring outcome for step {} of run {}: not part of pipeline {}",
            step_key,
            parent_run_id,
            pipeline.name
        );
    }

    let eligible = |key: &str| {
        parent
            .step_keys_to_execute
            .as_ref()
            .is_none_or(|subset| subset.contains(key))
    };

    let failed = latest
        .iter()
        .filter(|(key, status)| **status == StepStatus::Failure && eligible(**key))
        .map(|(key, _)| *key);

    let selection: BTreeSet<String> = pipeline
        .steps
        .downstream_closure(failed)
        .into_iter()
        .filter(|key| eligible(key.as_str()))
        .collect();

    if selection.is_empty() {
        return Err(PlanningError::NothingToReexecute {
            parent_run_id: parent_run_id.to_string(),
        });
    }

    tracing::info!(
        "Planned re-execution of {} from failure: {} of {} steps ({:?})",
        parent_run_id,
        selection.len(),
        pipeline.steps.len(),
        selection
    );

    Ok(selection)
}

/// Latest status per step; outcomes are ordered oldest first
fn latest_outcomes(outcomes: &[StepOutcome]) -> HashMap<&str, StepStatus> {
    outcomes
        .iter()
        .map(|outcome| (outcome.step_key.as_str(), outcome.status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRunStore, RunStore};
    use crate::testing::{nightly_pipeline, sample_run};
    use pretty_assertions::assert_eq;
    use sluice_core::graph::{StepDefinition, StepGraph};

    fn keys(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    async fn store_with(run_id: &str, outcomes: Vec<StepOutcome>) -> InMemoryRunStore {
        let store = InMemoryRunStore::new();
        store.create(sample_run(run_id)).await.unwrap();
        for outcome in outcomes {
            store.record_step_outcome(run_id, outcome).await;
        }
        store
    }

    #[test]
    fn test_only_from_failure_is_supported() {
        assert!(check_policy(ReexecutionPolicy::FromFailure).is_ok());

        let err = check_policy(ReexecutionPolicy::AllSteps).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::UnsupportedPolicy {
                policy: ReexecutionPolicy::AllSteps
            }
        ));
    }

    #[tokio::test]
    async fn test_selects_failed_step_and_its_dependents() {
        let store = store_with(
            "parent",
            vec![
                StepOutcome::success("a"),
                StepOutcome::failure("b"),
                StepOutcome::success("c"),
            ],
        )
        .await;

        let selection = plan_from_failure(&store, "parent", &nightly_pipeline())
            .await
            .unwrap();

        assert_eq!(selection, keys(&["b", "c"]));
    }

    #[tokio::test]
    async fn test_all_success_has_nothing_to_reexecute() {
        let store = store_with(
            "parent",
            vec![
                StepOutcome::success("a"),
                StepOutcome::success("b"),
                StepOutcome::success("c"),
            ],
        )
        .await;

        let err = plan_from_failure(&store, "parent", &nightly_pipeline())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlanningError::NothingToReexecute { parent_run_id } if parent_run_id == "parent"
        ));
    }

    #[tokio::test]
    async fn test_missing_parent() {
        let store = InMemoryRunStore::new();

        let err = plan_from_failure(&store, "ghost", &nightly_pipeline())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanningError::ParentNotFound { run_id } if run_id == "ghost"));
    }

    #[tokio::test]
    async fn test_latest_outcome_wins() {
        let store = store_with(
            "parent",
            vec![
                StepOutcome::failure("a"),
                StepOutcome::success("a"),
                StepOutcome::success("b"),
                StepOutcome::failure("c"),
            ],
        )
        .await;

        let selection = plan_from_failure(&store, "parent", &nightly_pipeline())
            .await
            .unwrap();

        assert_eq!(selection, keys(&["c"]));
    }

    #[tokio::test]
    async fn test_unstarted_and_skipped_steps_follow_failed_upstream() {
        let graph = StepGraph::new([
            StepDefinition::new("fetch"),
            StepDefinition::new("parse").after(["fetch"]),
            StepDefinition::new("report").after(["parse"]),
            StepDefinition::new("audit").after(["parse"]),
            StepDefinition::new("archive").after(["fetch"]),
            StepDefinition::new("notify"),
        ])
        .unwrap();
        let pipeline = ResolvedPipeline::new("ingest", nightly_pipeline().origin, graph);

        // report skipped, audit never started, notify never started but
        // depends on nothing that failed
        let store = store_with(
            "parent",
            vec![
                StepOutcome::success("fetch"),
                StepOutcome::success("archive"),
                StepOutcome::failure("parse"),
                StepOutcome::skipped("report"),
            ],
        )
        .await;

        let selection = plan_from_failure(&store, "parent", &pipeline).await.unwrap();
        assert_eq!(selection, keys(&["audit", "parse", "report"]));
    }

    #[tokio::test]
    async fn test_respects_parent_step_subset() {
        let store = InMemoryRunStore::new();
        let mut parent = sample_run("parent");
        parent.step_keys_to_execute = Some(keys(&["a", "b"]));
        store.create(parent).await.unwrap();
        store.record_step_outcome("parent", StepOutcome::success("a")).await;
        store.record_step_outcome("parent", StepOutcome::failure("b")).await;

        let selection = plan_from_failure(&store, "parent", &nightly_pipeline())
            .await
            .unwrap();

        assert_eq!(selection, keys(&["b"]));
    }

    #[tokio::test]
    async fn test_outcomes_for_unknown_steps_are_ignored() {
        let store = store_with(
            "parent",
            vec![StepOutcome::success("a"), StepOutcome::failure("renamed")],
        )
        .await;

        let err = plan_from_failure(&store, "parent", &nightly_pipeline())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanningError::NothingToReexecute { .. }));
    }
}
