//! Run Query Facade
//!
//! Read path used to report a run back to the caller. Always reads the store,
//! so status changes made by the backend after submission are visible.

use sluice_core::domain::run::PipelineRun;
use std::collections::{BTreeSet, HashMap};

use crate::error::RunStoreError;
use crate::repository::RunStore;

/// Fetches the runs with the given ids; unknown ids are omitted
pub async fn get_by_ids<S>(
    store: &S,
    run_ids: &BTreeSet<String>,
) -> Result<HashMap<String, PipelineRun>, RunStoreError>
where
    S: RunStore + ?Sized,
{
    if run_ids.is_empty() {
        return Ok(HashMap::new());
    }

    store.get_by_ids(run_ids).await
}

/// Fetches a single run
pub async fn get_by_id<S>(store: &S, run_id: &str) -> Result<Option<PipelineRun>, RunStoreError>
where
    S: RunStore + ?Sized,
{
    let run_ids = BTreeSet::from([run_id.to_string()]);
    Ok(get_by_ids(store, &run_ids).await?.remove(run_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRunStore;
    use crate::testing::sample_run;
    use sluice_core::domain::run::RunStatus;

    #[tokio::test]
    async fn test_reads_fresh_status() {
        let store = InMemoryRunStore::new();
        store.create(sample_run("r1")).await.unwrap();
        store.update_status("r1", RunStatus::Started).await;

        let run = get_by_id(&store, "r1").await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Started);
    }

    #[tokio::test]
    async fn test_get_by_ids() {
        let store = InMemoryRunStore::new();
        store.create(sample_run("r1")).await.unwrap();
        store.create(sample_run("r2")).await.unwrap();

        let ids = BTreeSet::from(["r1".to_string(), "r2".to_string(), "r3".to_string()]);
        let runs = get_by_ids(&store, &ids).await.unwrap();

        assert_eq!(runs.len(), 2);
        assert!(get_by_ids(&store, &BTreeSet::new()).await.unwrap().is_empty());
        assert!(get_by_id(&store, "r3").await.unwrap().is_none());
    }
}
