//! Pipeline execution DTOs
//!
//! Two responses feed a `PipelineRun`: the execution summary listing (one
//! entry per run, with a layout node per stage) and the execution graph of a
//! single stage (one node per step, with the delegates each step ran on).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FailureInfo, from_epoch_millis, required};
use crate::domain::UNKNOWN;
use crate::domain::execution::{ExecutionStatus, PipelineRun, StepDelegateInfo};
use crate::error::DecodeError;

const ENTITY: &str = "execution";

/// Entry of the execution summary listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummaryRecord {
    #[serde(default)]
    pub plan_execution_id: Option<String>,

    #[serde(default)]
    pub start_ts: Option<i64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub failure_info: Option<FailureInfo>,

    /// Stage level nodes keyed by node id
    #[serde(default)]
    pub layout_node_map: HashMap<String, LayoutNode>,
}

/// Stage node in the execution layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    #[serde(default)]
    pub node_type: Option<String>,

    #[serde(default)]
    pub node_identifier: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub node_uuid: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub failure_info: Option<FailureInfo>,
}

/// The requested stage as found in an execution summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRef {
    /// Node id used to fetch the stage's execution graph
    pub node_id: String,
    pub status: ExecutionStatus,
    pub failure_message: Option<String>,
}

/// Request body for the execution summary listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFilter {
    pub filter_type: String,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: i64,
    pub end_time: i64,
}

impl ExecutionFilter {
    /// Executions started between `since` and `until`
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            filter_type: "PipelineExecution".to_string(),
            time_range: TimeRange {
                start_time: since.timestamp_millis(),
                end_time: until.timestamp_millis(),
            },
        }
    }
}

impl ExecutionSummaryRecord {
    /// Locate the stage named `stage_name` (display name or identifier)
    ///
    /// Returns `Ok(None)` when the execution has no such stage, and an error
    /// when the stage exists but carries no status.
    pub fn find_stage(&self, stage_name: &str) -> Result<Option<StageRef>, DecodeError> {
        let found = self.layout_node_map.iter().find(|(_, node)| {
            node.name.as_deref() == Some(stage_name)
                || node.node_identifier.as_deref() == Some(stage_name)
        });

        let Some((key, node)) = found else {
            return Ok(None);
        };

        let status = required("stage", "status", node.status.clone())?;
        let node_id = node
            .node_uuid
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| key.clone());

        Ok(Some(StageRef {
            node_id,
            status: ExecutionStatus::parse(&status),
            failure_message: node
                .failure_info
                .as_ref()
                .and_then(FailureInfo::text)
                .map(str::to_string),
        }))
    }

    /// Execution id, if present
    pub fn execution_id(&self) -> Option<&str> {
        self.plan_execution_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Build a run for `stage` with the given step delegates
    pub fn into_run(
        self,
        stage: &StageRef,
        stage_delegates: Vec<StepDelegateInfo>,
    ) -> Result<PipelineRun, DecodeError> {
        let execution_id = required(ENTITY, "planExecutionId", self.plan_execution_id)?;
        let start_time = from_epoch_millis(ENTITY, "startTs", self.start_ts)?
            .ok_or(DecodeError::MissingField {
                entity: ENTITY,
                field: "startTs",
            })?;

        let failure_message = stage
            .failure_message
            .clone()
            .or_else(|| {
                self.failure_info
                    .as_ref()
                    .and_then(FailureInfo::text)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| UNKNOWN.to_string());

        Ok(PipelineRun {
            execution_id,
            start_time,
            status: stage.status,
            failure_message,
            stage_delegates,
        })
    }
}

/// Payload of the execution detail endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetail {
    #[serde(default)]
    pub execution_graph: Option<ExecutionGraph>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionGraph {
    #[serde(default)]
    pub node_map: HashMap<String, GraphNode>,
}

/// Step (or section) node of a stage graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub start_ts: Option<i64>,

    #[serde(default)]
    pub failure_info: Option<FailureInfo>,

    #[serde(default)]
    pub delegate_info_list: Vec<DelegateInfoRecord>,
}

/// Delegate reference recorded on a step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegateInfoRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

impl ExecutionGraph {
    /// Step/delegate pairs of the graph in execution order
    ///
    /// Nodes that never reached a delegate (sections, approvals, skipped
    /// steps) are left out. The returned entries carry no registry snapshot.
    pub fn step_delegates(&self) -> Vec<StepDelegateInfo> {
        let mut nodes: Vec<&GraphNode> = self
            .node_map
            .values()
            .filter(|node| !node.delegate_info_list.is_empty())
            .collect();
        nodes.sort_by(|a, b| {
            a.start_ts
                .unwrap_or(i64::MAX)
                .cmp(&b.start_ts.unwrap_or(i64::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut steps = Vec::new();
        for node in nodes {
            let step_name = node
                .name
                .clone()
                .or_else(|| node.identifier.clone())
                .unwrap_or_else(|| UNKNOWN.to_string());
            let step_status = ExecutionStatus::parse(node.status.as_deref().unwrap_or_default());
            let error_message = node
                .failure_info
                .as_ref()
                .and_then(FailureInfo::text)
                .map(str::to_string);

            for info in &node.delegate_info_list {
                let delegate_id = info.id.clone().unwrap_or_default();
                let delegate_name = info.name.clone().unwrap_or_default();
                if delegate_id.is_empty() && delegate_name.is_empty() {
                    continue;
                }
                steps.push(StepDelegateInfo {
                    step_name: step_name.clone(),
                    step_status,
                    error_message: error_message.clone(),
                    delegate_id,
                    delegate_name,
                    delegate: None,
                });
            }
        }
        steps
    }
}
