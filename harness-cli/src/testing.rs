//! In-memory platform for tests

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harness_client::{ClientError, PlatformApi, Result};
use harness_core::domain::connector::Connector;
use harness_core::domain::delegate::{Delegate, DelegateStatus};
use harness_core::domain::execution::{ExecutionStatus, PipelineRun, StepDelegateInfo};

/// Registry and execution history held in memory
#[derive(Default)]
pub struct InMemoryPlatform {
    pub delegates: BTreeMap<String, Delegate>,
    /// Delegates reachable by id lookup but absent from the listing
    pub hidden_delegates: BTreeMap<String, Delegate>,
    pub connectors: Vec<Connector>,
    pub runs: Vec<PipelineRun>,
    /// Make `list_delegates` report an application failure
    pub registry_unavailable: bool,
    /// Make `list_failed_runs` report an application failure
    pub history_unavailable: bool,
    /// Ids passed to `get_delegate`, in call order
    pub lookups: Mutex<Vec<String>>,
}

impl InMemoryPlatform {
    pub fn with_delegates(delegates: Vec<Delegate>) -> Self {
        Self {
            delegates: delegates.into_iter().map(|d| (d.id.clone(), d)).collect(),
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

fn application_error(endpoint: &str) -> ClientError {
    ClientError::Application {
        endpoint: endpoint.to_string(),
        message: "service unavailable".to_string(),
    }
}

#[async_trait]
impl PlatformApi for InMemoryPlatform {
    async fn get_delegate(&self, delegate_id: &str) -> Result<Delegate> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(delegate_id.to_string());
        }
        self.delegates
            .get(delegate_id)
            .or_else(|| self.hidden_delegates.get(delegate_id))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("delegate {}", delegate_id)))
    }

    async fn list_delegates(&self) -> Result<BTreeMap<String, Delegate>> {
        if self.registry_unavailable {
            return Err(application_error("/ng/api/delegate-setup"));
        }
        Ok(self.delegates.clone())
    }

    async fn list_connectors(&self, selector: Option<&str>) -> Result<Vec<Connector>> {
        Ok(self
            .connectors
            .iter()
            .filter(|c| selector.is_none_or(|s| c.uses_selector(s)))
            .cloned()
            .collect())
    }

    async fn list_failed_runs(
        &self,
        _pipeline_id: &str,
        _stage_name: &str,
        _since_days: u32,
    ) -> Result<Vec<PipelineRun>> {
        if self.history_unavailable {
            return Err(application_error("/pipeline/api/pipelines/execution/summary"));
        }
        Ok(self.runs.clone())
    }
}

pub fn delegate(id: &str, name: &str, labels: &[&str]) -> Delegate {
    Delegate {
        id: id.to_string(),
        name: name.to_string(),
        hostname: format!("{}.internal", name),
        ip: "10.0.0.1".to_string(),
        status: DelegateStatus::Enabled,
        version: "24.01.82108".to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        last_heartbeat: None,
        connected_at: None,
        profile: None,
    }
}

/// Step reference as the execution history reports it (unresolved)
pub fn step(name: &str, delegate_id: &str, delegate_name: &str) -> StepDelegateInfo {
    StepDelegateInfo {
        step_name: name.to_string(),
        step_status: ExecutionStatus::Failed,
        error_message: Some(format!("{} failed", name)),
        delegate_id: delegate_id.to_string(),
        delegate_name: delegate_name.to_string(),
        delegate: None,
    }
}

pub fn run(id: &str, start_time: DateTime<Utc>, steps: Vec<StepDelegateInfo>) -> PipelineRun {
    PipelineRun {
        execution_id: id.to_string(),
        start_time,
        status: ExecutionStatus::Failed,
        failure_message: "stage failed".to_string(),
        stage_delegates: steps,
    }
}

/// Log lines at WARN and above emitted on the current thread
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Capture until the returned guard is dropped
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
