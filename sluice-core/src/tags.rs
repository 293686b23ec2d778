//! Well-known run tags
//!
//! Written by the orchestrator on re-executed runs so lineage stays visible to
//! anything that only looks at tags.

use std::collections::BTreeMap;

use crate::domain::run::RunLineage;

pub const PARENT_RUN_ID_TAG: &str = "sluice/parent_run_id";
pub const ROOT_RUN_ID_TAG: &str = "sluice/root_run_id";
pub const RESUME_RETRY_TAG: &str = "sluice/is_resume_retry";

/// Tags recording a run's lineage
pub fn lineage_tags(lineage: &RunLineage) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            PARENT_RUN_ID_TAG.to_string(),
            lineage.parent_run_id.clone(),
        ),
        (ROOT_RUN_ID_TAG.to_string(), lineage.root_run_id.clone()),
    ])
}
