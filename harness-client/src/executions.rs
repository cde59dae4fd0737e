//! Pipeline execution endpoints

use chrono::{DateTime, Utc};
use harness_core::domain::execution::{PipelineRun, StepDelegateInfo, window_start};
use harness_core::dto::Page;
use harness_core::dto::execution::{
    ExecutionDetail, ExecutionFilter, ExecutionSummaryRecord, StageRef,
};
use tracing::{debug, warn};

use crate::HarnessClient;
use crate::delegates::has_more_pages;
use crate::error::Result;

const EXECUTION_SUMMARY_PATH: &str = "/pipeline/api/pipelines/execution/summary";
const EXECUTION_DETAIL_PATH: &str = "/pipeline/api/pipelines/execution/v2";
const PAGE_SIZE: u32 = 50;

impl HarnessClient {
    // =============================================================================
    // Execution History
    // =============================================================================

    /// List runs of a pipeline whose named stage failed
    ///
    /// The stage's own status decides whether a run failed; the overall run
    /// status is ignored. Steps of the failed stage are attached with the
    /// delegate references recorded on them (not yet resolved against the
    /// registry).
    ///
    /// # Arguments
    /// * `pipeline_id` - Pipeline identifier
    /// * `stage_name` - Stage display name or identifier
    /// * `since_days` - Lookback window in days
    ///
    /// # Returns
    /// Failed runs in the order the platform returned them
    pub async fn list_failed_runs(
        &self,
        pipeline_id: &str,
        stage_name: &str,
        since_days: u32,
    ) -> Result<Vec<PipelineRun>> {
        self.config().require_scope()?;

        let until = Utc::now();
        let since = window_start(until, since_days);

        let mut runs = Vec::new();
        for record in self.list_executions(pipeline_id, since, until).await? {
            let Some((execution_id, stage)) = select_failed_stage(&record, stage_name, since)
            else {
                continue;
            };

            let steps = self.stage_step_delegates(&execution_id, &stage).await?;
            match record.into_run(&stage, steps) {
                Ok(run) => runs.push(run),
                Err(e) => warn!(execution_id = %execution_id, "Skipping execution: {}", e),
            }
        }

        debug!(count = runs.len(), pipeline_id, stage_name, "Found failed runs");
        Ok(runs)
    }

    /// Page through the execution summaries of a pipeline within a time range
    async fn list_executions(
        &self,
        pipeline_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ExecutionSummaryRecord>> {
        let filter = ExecutionFilter::between(since, until);
        let mut records = Vec::new();
        let mut page_index = 0;

        loop {
            let mut query = self.scoped_query();
            query.push(("pipelineIdentifier", pipeline_id.to_string()));
            query.push(("page", page_index.to_string()));
            query.push(("size", PAGE_SIZE.to_string()));

            debug!(page_index, pipeline_id, "Fetching execution page");
            let page: Page<ExecutionSummaryRecord> = self
                .post_data(EXECUTION_SUMMARY_PATH, &query, &filter)
                .await?;

            let received = page.content.len();
            records.extend(page.content);

            page_index += 1;
            if !has_more_pages(page.total_pages, page_index, received, PAGE_SIZE) {
                break;
            }
        }

        Ok(records)
    }

    /// Steps of one stage and the delegates they ran on
    ///
    /// A platform-reported failure for the graph leaves the run without step
    /// data instead of failing the whole listing.
    async fn stage_step_delegates(
        &self,
        execution_id: &str,
        stage: &StageRef,
    ) -> Result<Vec<StepDelegateInfo>> {
        let mut query = self.scoped_query();
        query.push(("stageNodeId", stage.node_id.clone()));
        query.push(("renderFullBottomGraph", "true".to_string()));

        match self
            .get_resource::<ExecutionDetail>(EXECUTION_DETAIL_PATH, execution_id, &query)
            .await
        {
            Ok(detail) => Ok(detail
                .execution_graph
                .map(|graph| graph.step_delegates())
                .unwrap_or_default()),
            Err(e) if e.is_application_error() || e.is_not_found() => {
                warn!(execution_id, "No step details available: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

/// Decide whether an execution summary is a failed run of `stage_name`
///
/// Only the stage's own status counts; the overall execution status is
/// ignored. Returns the execution id together with the failed stage.
pub(crate) fn select_failed_stage(
    record: &ExecutionSummaryRecord,
    stage_name: &str,
    since: DateTime<Utc>,
) -> Option<(String, StageRef)> {
    let Some(execution_id) = record.execution_id() else {
        warn!("Skipping execution without planExecutionId");
        return None;
    };

    if record.start_ts.is_some_and(|ts| ts < since.timestamp_millis()) {
        return None;
    }

    let stage = match record.find_stage(stage_name) {
        Ok(Some(stage)) => stage,
        Ok(None) => {
            debug!(execution_id, stage_name, "Stage not present in execution");
            return None;
        }
        Err(e) => {
            warn!(execution_id, "Skipping execution: {}", e);
            return None;
        }
    };

    stage
        .status
        .is_failure()
        .then(|| (execution_id.to_string(), stage))
}
