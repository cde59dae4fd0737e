//! Failure correlator
//!
//! Joins failed runs of a pipeline stage with the delegate registry so every
//! step carries a snapshot of the delegate that ran it. A delegate that cannot
//! be resolved is reported and left empty; it never fails the query.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use chrono::{DateTime, Utc};
use harness_client::PlatformApi;
use harness_core::domain::delegate::Delegate;
use harness_core::domain::execution::{PipelineRun, StepDelegateInfo, sort_newest_first};
use tracing::{debug, warn};

/// What to check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineQuery {
    pub pipeline_id: String,
    pub stage_name: String,
    pub since_days: u32,
}

/// A step whose delegate reference did not match any registered delegate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDelegate {
    pub execution_id: String,
    pub step_name: String,
    pub delegate_id: String,
    pub delegate_name: String,
}

/// Correlated runs, newest first, plus the references that stayed unresolved
#[derive(Debug, Clone, Default)]
pub struct Correlation {
    pub runs: Vec<PipelineRun>,
    pub unresolved: Vec<UnresolvedDelegate>,
}

/// Joins execution history with the delegate registry
pub struct FailureCorrelator<'a> {
    platform: &'a dyn PlatformApi,
}

impl<'a> FailureCorrelator<'a> {
    pub fn new(platform: &'a dyn PlatformApi) -> Self {
        Self { platform }
    }

    /// Failed runs of the stage within the lookback window, with delegates
    /// resolved
    pub async fn check_pipeline(&self, query: &PipelineQuery) -> Result<Correlation> {
        self.check_pipeline_at(query, Utc::now()).await
    }

    /// Same as [`check_pipeline`](Self::check_pipeline) with an explicit clock
    pub async fn check_pipeline_at(
        &self,
        query: &PipelineQuery,
        now: DateTime<Utc>,
    ) -> Result<Correlation> {
        let mut runs = self
            .platform
            .list_failed_runs(&query.pipeline_id, &query.stage_name, query.since_days)
            .await?;

        let fetched = runs.len();
        runs.retain(|run| run.started_within(now, query.since_days));
        if runs.len() < fetched {
            debug!(
                dropped = fetched - runs.len(),
                "Dropped runs outside the lookback window"
            );
        }
        sort_newest_first(&mut runs);

        if runs.is_empty() {
            return Ok(Correlation::default());
        }

        let registry = self.load_registry().await?;
        let mut resolver = Resolver {
            platform: self.platform,
            registry,
            looked_up: HashMap::new(),
        };

        let mut unresolved = Vec::new();
        for run in &mut runs {
            for step in &mut run.stage_delegates {
                step.delegate = resolver.resolve(step).await;
                if step.delegate.is_none() {
                    warn!(
                        execution_id = %run.execution_id,
                        step = %step.step_name,
                        delegate_id = %step.delegate_id,
                        "Delegate could not be resolved"
                    );
                    unresolved.push(UnresolvedDelegate {
                        execution_id: run.execution_id.clone(),
                        step_name: step.step_name.clone(),
                        delegate_id: step.delegate_id.clone(),
                        delegate_name: step.delegate_name.clone(),
                    });
                }
            }
        }

        Ok(Correlation { runs, unresolved })
    }

    /// Full registry; an application-level failure degrades to an empty
    /// registry so steps fall back to single lookups
    async fn load_registry(&self) -> Result<BTreeMap<String, Delegate>> {
        match self.platform.list_delegates().await {
            Ok(registry) => Ok(registry),
            Err(e) if e.is_application_error() => {
                warn!("Delegate registry unavailable, resolving individually: {}", e);
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolves step references: registry by id, then single lookup by id, then
/// registry by name
struct Resolver<'a> {
    platform: &'a dyn PlatformApi,
    registry: BTreeMap<String, Delegate>,
    looked_up: HashMap<String, Option<Delegate>>,
}

impl Resolver<'_> {
    async fn resolve(&mut self, step: &StepDelegateInfo) -> Option<Delegate> {
        if !step.delegate_id.is_empty() {
            if let Some(delegate) = self.registry.get(&step.delegate_id) {
                return Some(delegate.clone());
            }

            if !self.looked_up.contains_key(&step.delegate_id) {
                let found = match self.platform.get_delegate(&step.delegate_id).await {
                    Ok(delegate) => Some(delegate),
                    Err(e) => {
                        debug!(delegate_id = %step.delegate_id, "Lookup failed: {}", e);
                        None
                    }
                };
                self.looked_up.insert(step.delegate_id.clone(), found);
            }

            if let Some(Some(delegate)) = self.looked_up.get(&step.delegate_id) {
                return Some(delegate.clone());
            }
        }

        if step.delegate_name.is_empty() {
            return None;
        }
        self.registry
            .values()
            .find(|d| d.name == step.delegate_name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryPlatform, delegate, run, step};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()
    }

    fn query(days: u32) -> PipelineQuery {
        PipelineQuery {
            pipeline_id: "build_and_deploy".to_string(),
            stage_name: "Build".to_string(),
            since_days: days,
        }
    }

    #[tokio::test]
    async fn test_resolves_step_delegates_from_registry() {
        let mut platform =
            InMemoryPlatform::with_delegates(vec![delegate("d1", "worker-1", &["linux", "docker"])]);
        platform.runs = vec![run(
            "exec-1",
            now() - Duration::hours(1),
            vec![step("Push", "d1", "worker-1")],
        )];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        assert_eq!(correlation.runs.len(), 1);
        let resolved = correlation.runs[0].stage_delegates[0].delegate.as_ref().unwrap();
        assert_eq!(resolved.name, "worker-1");
        assert!(correlation.unresolved.is_empty());
        assert!(platform.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_delegate_is_reported_not_fatal() {
        let mut platform = InMemoryPlatform::with_delegates(vec![delegate("d1", "worker-1", &[])]);
        platform.runs = vec![run(
            "exec-1",
            now() - Duration::hours(1),
            vec![step("Build", "d1", "worker-1"), step("Push", "gone", "old-worker")],
        )];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        let steps = &correlation.runs[0].stage_delegates;
        assert!(steps[0].delegate.is_some());
        assert!(steps[1].delegate.is_none());
        assert_eq!(
            correlation.unresolved,
            vec![UnresolvedDelegate {
                execution_id: "exec-1".to_string(),
                step_name: "Push".to_string(),
                delegate_id: "gone".to_string(),
                delegate_name: "old-worker".to_string(),
            }]
        );
        assert_eq!(platform.lookups(), vec!["gone"]);
    }

    #[tokio::test]
    async fn test_single_lookup_is_cached_per_delegate() {
        let mut platform = InMemoryPlatform::default();
        platform
            .hidden_delegates
            .insert("d9".to_string(), delegate("d9", "worker-9", &["gpu"]));
        platform.runs = vec![
            run("exec-2", now() - Duration::hours(1), vec![step("A", "d9", "worker-9")]),
            run("exec-1", now() - Duration::hours(2), vec![step("B", "d9", "worker-9")]),
        ];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        assert!(
            correlation
                .runs
                .iter()
                .all(|r| r.stage_delegates[0].delegate.is_some())
        );
        assert_eq!(platform.lookups(), vec!["d9"]);
    }

    #[tokio::test]
    async fn test_registry_failure_degrades_to_single_lookups() {
        let mut platform = InMemoryPlatform::with_delegates(vec![delegate("d1", "worker-1", &[])]);
        platform.registry_unavailable = true;
        platform.runs = vec![run(
            "exec-1",
            now() - Duration::hours(1),
            vec![step("Build", "d1", "worker-1")],
        )];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        assert!(correlation.runs[0].stage_delegates[0].delegate.is_some());
        assert_eq!(platform.lookups(), vec!["d1"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_name_when_id_missing() {
        let mut platform = InMemoryPlatform::with_delegates(vec![delegate("d1", "worker-1", &[])]);
        platform.runs = vec![run(
            "exec-1",
            now() - Duration::hours(1),
            vec![step("Build", "", "worker-1")],
        )];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        let resolved = correlation.runs[0].stage_delegates[0].delegate.as_ref().unwrap();
        assert_eq!(resolved.id, "d1");
        assert!(platform.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_window_boundary_and_ordering() {
        let mut platform = InMemoryPlatform::default();
        platform.runs = vec![
            run("boundary", now() - Duration::days(7), vec![]),
            run("too-old", now() - Duration::days(7) - Duration::seconds(1), vec![]),
            run("newest", now() - Duration::minutes(5), vec![]),
            run("middle", now() - Duration::days(2), vec![]),
        ];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        let ids: Vec<_> = correlation
            .runs
            .iter()
            .map(|r| r.execution_id.as_str())
            .collect();
        assert_eq!(ids, vec!["newest", "middle", "boundary"]);
    }

    #[tokio::test]
    async fn test_largest_lookback_keeps_every_run() {
        let mut platform = InMemoryPlatform::default();
        platform.runs = vec![
            run("ancient", now() - Duration::days(365 * 50), vec![]),
            run("recent", now() - Duration::hours(1), vec![]),
        ];

        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(u32::MAX), now())
            .await
            .unwrap();

        assert_eq!(correlation.runs.len(), 2);
        assert_eq!(correlation.runs[0].execution_id, "recent");
    }

    #[tokio::test]
    async fn test_no_failed_runs_is_empty() {
        let platform = InMemoryPlatform::default();
        let correlation = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap();

        assert!(correlation.runs.is_empty());
        assert!(correlation.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_propagates() {
        let platform = InMemoryPlatform {
            history_unavailable: true,
            ..Default::default()
        };
        let err = FailureCorrelator::new(&platform)
            .check_pipeline_at(&query(7), now())
            .await
            .unwrap_err();

        let client_error = err.downcast_ref::<harness_client::ClientError>().unwrap();
        assert!(client_error.is_application_error());
    }
}
