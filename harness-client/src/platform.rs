//! Platform access trait
//!
//! The seam between the correlator and the network. [`HarnessClient`] is the
//! production implementation; tests substitute an in-memory registry.

use std::collections::BTreeMap;

use async_trait::async_trait;
use harness_core::domain::connector::Connector;
use harness_core::domain::delegate::Delegate;
use harness_core::domain::execution::PipelineRun;

use crate::HarnessClient;
use crate::error::Result;

/// Read operations against the platform
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Fetch one delegate; `NotFound` when it is not registered
    async fn get_delegate(&self, delegate_id: &str) -> Result<Delegate>;

    /// Fetch every delegate, keyed by id
    async fn list_delegates(&self) -> Result<BTreeMap<String, Delegate>>;

    /// Fetch connectors, optionally only those pinned to `selector`
    async fn list_connectors(&self, selector: Option<&str>) -> Result<Vec<Connector>>;

    /// Fetch runs whose `stage_name` stage failed in the last `since_days` days
    async fn list_failed_runs(
        &self,
        pipeline_id: &str,
        stage_name: &str,
        since_days: u32,
    ) -> Result<Vec<PipelineRun>>;
}

#[async_trait]
impl PlatformApi for HarnessClient {
    async fn get_delegate(&self, delegate_id: &str) -> Result<Delegate> {
        HarnessClient::get_delegate(self, delegate_id).await
    }

    async fn list_delegates(&self) -> Result<BTreeMap<String, Delegate>> {
        HarnessClient::list_delegates(self).await
    }

    async fn list_connectors(&self, selector: Option<&str>) -> Result<Vec<Connector>> {
        HarnessClient::list_connectors(self, selector).await
    }

    async fn list_failed_runs(
        &self,
        pipeline_id: &str,
        stage_name: &str,
        since_days: u32,
    ) -> Result<Vec<PipelineRun>> {
        HarnessClient::list_failed_runs(self, pipeline_id, stage_name, since_days).await
    }
}
