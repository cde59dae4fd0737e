//! Pipeline-check output variables
//!
//! A flat `KEY=value` file read by the orchestrating pipeline step. Key names
//! and line format are consumed by external automation and must not change.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use harness_core::domain::TIME_FORMAT;
use harness_core::domain::execution::PipelineRun;

pub const FAILED_RUNS_COUNT: &str = "FAILED_RUNS_COUNT";
pub const LAST_FAILED_RUN_ID: &str = "LAST_FAILED_RUN_ID";
pub const LAST_FAILED_TIME: &str = "LAST_FAILED_TIME";
pub const DELEGATES_USED: &str = "DELEGATES_USED";
pub const DELEGATE_LABELS: &str = "DELEGATE_LABELS";

/// Summary of a pipeline check
///
/// The "most recent" run is the first of the (newest-first) run list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub failed_runs_count: usize,
    pub last_failed_run_id: Option<String>,
    pub last_failed_time: Option<DateTime<Utc>>,
    /// Resolved delegates of the most recent run
    pub delegates_used: Vec<String>,
    /// Labels across `delegates_used`
    pub delegate_labels: Vec<String>,
}

impl FailureReport {
    pub fn from_runs(runs: &[PipelineRun]) -> Self {
        let latest = runs.first();
        Self {
            failed_runs_count: runs.len(),
            last_failed_run_id: latest.map(|r| r.execution_id.clone()),
            last_failed_time: latest.map(|r| r.start_time),
            delegates_used: latest.map(PipelineRun::delegate_names).unwrap_or_default(),
            delegate_labels: latest.map(PipelineRun::delegate_labels).unwrap_or_default(),
        }
    }

    /// Ordered `(key, value)` pairs; optional keys are omitted when empty
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![(FAILED_RUNS_COUNT, self.failed_runs_count.to_string())];

        if let Some(id) = &self.last_failed_run_id {
            entries.push((LAST_FAILED_RUN_ID, single_line(id)));
        }
        if let Some(time) = self.last_failed_time {
            entries.push((LAST_FAILED_TIME, time.format(TIME_FORMAT).to_string()));
        }
        if !self.delegates_used.is_empty() {
            entries.push((DELEGATES_USED, join_values(&self.delegates_used)));
        }
        if !self.delegate_labels.is_empty() {
            entries.push((DELEGATE_LABELS, join_values(&self.delegate_labels)));
        }

        entries
    }

    /// File contents: one `KEY=value` per line
    pub fn to_key_values(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(key, value)| format!("{}={}\n", key, value))
            .collect()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_key_values())
            .with_context(|| format!("Failed to write output variables to {}", path.display()))
    }
}

/// Replace line breaks and other control characters so a value stays on its line
fn single_line(value: &str) -> String {
    value.replace(|c: char| c.is_control(), "_")
}

/// Comma-join values; commas inside a value are replaced so the list splits cleanly
fn join_values(values: &[String]) -> String {
    values
        .iter()
        .map(|value| single_line(value).replace(',', "_"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use harness_core::domain::delegate::{Delegate, DelegateStatus};
    use harness_core::domain::execution::{ExecutionStatus, StepDelegateInfo};

    fn worker_1() -> Delegate {
        Delegate {
            id: "d1".to_string(),
            name: "worker-1".to_string(),
            hostname: "host-1".to_string(),
            ip: "10.0.0.1".to_string(),
            status: DelegateStatus::Enabled,
            version: "1.0".to_string(),
            labels: vec!["linux".to_string(), "docker".to_string()],
            last_heartbeat: None,
            connected_at: None,
            profile: None,
        }
    }

    fn run(delegate: Option<Delegate>) -> PipelineRun {
        PipelineRun {
            execution_id: "exec-1".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            status: ExecutionStatus::Failed,
            failure_message: "boom".to_string(),
            stage_delegates: vec![StepDelegateInfo {
                step_name: "build".to_string(),
                step_status: ExecutionStatus::Failed,
                error_message: Some("boom".to_string()),
                delegate_id: "d1".to_string(),
                delegate_name: "worker-1".to_string(),
                delegate,
            }],
        }
    }

    #[test]
    fn test_single_failed_run_file_contents() {
        let report = FailureReport::from_runs(&[run(Some(worker_1()))]);
        assert_eq!(
            report.to_key_values(),
            "FAILED_RUNS_COUNT=1\n\
             LAST_FAILED_RUN_ID=exec-1\n\
             LAST_FAILED_TIME=2024-01-01 10:00:00\n\
             DELEGATES_USED=worker-1\n\
             DELEGATE_LABELS=linux,docker\n"
        );
    }

    #[test]
    fn test_unresolved_delegates_are_omitted() {
        let report = FailureReport::from_runs(&[run(None)]);
        let text = report.to_key_values();
        assert!(text.contains("FAILED_RUNS_COUNT=1\n"));
        assert!(!text.contains(DELEGATES_USED));
        assert!(!text.contains(DELEGATE_LABELS));
    }

    #[test]
    fn test_no_runs_only_has_count() {
        let report = FailureReport::from_runs(&[]);
        assert_eq!(report.to_key_values(), "FAILED_RUNS_COUNT=0\n");
    }

    #[test]
    fn test_labels_omitted_when_delegates_have_none() {
        let mut delegate = worker_1();
        delegate.labels.clear();
        let text = FailureReport::from_runs(&[run(Some(delegate))]).to_key_values();
        assert!(text.contains("DELEGATES_USED=worker-1\n"));
        assert!(!text.contains(DELEGATE_LABELS));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");

        FailureReport::from_runs(&[run(Some(worker_1()))])
            .write_to(&path)
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("FAILED_RUNS_COUNT=1\n"));
        assert!(written.contains("LAST_FAILED_RUN_ID=exec-1\n"));
    }

    #[test]
    fn test_values_cannot_break_the_file_format() {
        let report = FailureReport {
            failed_runs_count: 1,
            last_failed_run_id: Some("exec-1\nINJECTED=1".to_string()),
            last_failed_time: None,
            delegates_used: vec!["worker,1".to_string(), "worker-2\r\nX=y".to_string()],
            delegate_labels: vec!["linux".to_string(), "gpu,cuda".to_string()],
        };

        assert_eq!(
            report.to_key_values(),
            "FAILED_RUNS_COUNT=1\n\
             LAST_FAILED_RUN_ID=exec-1_INJECTED=1\n\
             DELEGATES_USED=worker_1,worker-2__X=y\n\
             DELEGATE_LABELS=linux,gpu_cuda\n"
        );
    }
}
