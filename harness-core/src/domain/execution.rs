//! Pipeline execution domain types
//!
//! A `PipelineRun` is one failed execution of a pipeline, narrowed to a single
//! stage, together with the delegates that ran the steps of that stage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::delegate::Delegate;

/// Earliest instant of a `days` long lookback window ending at `now`
///
/// Saturates at the earliest representable time instead of overflowing.
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// One failed execution of a pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Plan execution identifier
    pub execution_id: String,

    pub start_time: DateTime<Utc>,

    /// Status of the requested stage within this execution
    pub status: ExecutionStatus,

    pub failure_message: String,

    /// Steps of the requested stage that were dispatched to a delegate, in
    /// execution order
    pub stage_delegates: Vec<StepDelegateInfo>,
}

/// A stage step and the delegate it was dispatched to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDelegateInfo {
    pub step_name: String,

    pub step_status: ExecutionStatus,

    pub error_message: Option<String>,

    /// Delegate identifier as recorded on the step
    pub delegate_id: String,

    /// Delegate name as recorded on the step
    pub delegate_name: String,

    /// Registry snapshot of the delegate; `None` when it could not be resolved
    pub delegate: Option<Delegate>,
}

impl PipelineRun {
    /// Whether the run started within the last `days` days of `now`
    ///
    /// Both ends of the window are inclusive.
    pub fn started_within(&self, now: DateTime<Utc>, days: u32) -> bool {
        self.start_time >= window_start(now, days) && self.start_time <= now
    }

    /// Resolved delegates of this run, first occurrence per delegate id
    pub fn resolved_delegates(&self) -> Vec<&Delegate> {
        let mut seen: Vec<&Delegate> = Vec::new();
        for delegate in self.stage_delegates.iter().filter_map(|s| s.delegate.as_ref()) {
            if !seen.iter().any(|d| d.id == delegate.id) {
                seen.push(delegate);
            }
        }
        seen
    }

    /// Distinct names of the resolved delegates, in first-seen order
    pub fn delegate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for delegate in self.resolved_delegates() {
            if !names.contains(&delegate.name) {
                names.push(delegate.name.clone());
            }
        }
        names
    }

    /// Distinct labels across the resolved delegates, in first-seen order
    pub fn delegate_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for delegate in self.resolved_delegates() {
            for label in &delegate.labels {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }
        labels
    }
}

/// Order runs newest first
///
/// Runs sharing a start time keep their relative order.
pub fn sort_newest_first(runs: &mut [PipelineRun]) {
    runs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}

/// Status of a pipeline, stage or step execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Success,
    Running,
    Queued,
    Failed,
    Errored,
    Expired,
    Aborted,
    ApprovalRejected,
    IgnoreFailed,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    /// Parse a wire status
    ///
    /// The platform mixes `IgnoreFailed` and `IGNORE_FAILED` styles, so the
    /// comparison ignores case and underscores.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "success" => ExecutionStatus::Success,
            "running" | "asyncwaiting" | "taskwaiting" | "timedwaiting" => {
                ExecutionStatus::Running
            }
            "queued" | "notstarted" => ExecutionStatus::Queued,
            "failed" => ExecutionStatus::Failed,
            "errored" => ExecutionStatus::Errored,
            "expired" => ExecutionStatus::Expired,
            "aborted" => ExecutionStatus::Aborted,
            "approvalrejected" => ExecutionStatus::ApprovalRejected,
            "ignorefailed" => ExecutionStatus::IgnoreFailed,
            "skipped" => ExecutionStatus::Skipped,
            _ => ExecutionStatus::Unknown,
        }
    }

    /// Whether this status counts as a failure of the stage or step
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Failed
                | ExecutionStatus::Errored
                | ExecutionStatus::Expired
                | ExecutionStatus::ApprovalRejected
        )
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Queued => "QUEUED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Errored => "ERRORED",
            ExecutionStatus::Expired => "EXPIRED",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::ApprovalRejected => "APPROVAL_REJECTED",
            ExecutionStatus::IgnoreFailed => "IGNORE_FAILED",
            ExecutionStatus::Skipped => "SKIPPED",
            ExecutionStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}
