use std::sync::Arc;
use std::time::{Instant, SystemTime};

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::client::ProbeClient;
use super::request::build_request;
use super::types::{ProbeOutcome, SweepReport};
use crate::database::TargetStore;
use crate::database::models::{ProbeRecord, ProbeStatus, Target};
use crate::schedule;

/// Probes every due target and writes each result back through the store.
///
/// The executor does not schedule itself; an external trigger calls
/// [`run_sweep`](ProbeExecutor::run_sweep) and is assumed to have at most one
/// sweep in flight at a time. Within a sweep, targets are probed
/// concurrently with no ordering guarantee.
pub struct ProbeExecutor {
    store: Arc<dyn TargetStore>,
    client: Arc<dyn ProbeClient>,
}

impl ProbeExecutor {
    pub fn new(store: Arc<dyn TargetStore>, client: Arc<dyn ProbeClient>) -> Self {
        Self { store, client }
    }

    /// Run one sweep over a snapshot of the target list.
    ///
    /// Every per-target failure (unparseable curl text, transport error,
    /// non-success response, write-back racing a delete) stays contained in
    /// that target's outcome. Only a failed snapshot read escalates.
    pub async fn run_sweep(&self) -> Result<SweepReport> {
        let targets = self.store.list().await?;
        let now = SystemTime::now();

        let outcomes = join_all(
            targets
                .into_iter()
                .map(|target| self.probe_target(target, now)),
        )
        .await;

        let report = SweepReport::from_outcomes(outcomes);
        info!(
            total = report.total,
            executed = report.executed,
            skipped = report.skipped,
            "sweep finished"
        );
        Ok(report)
    }

    async fn probe_target(&self, target: Target, now: SystemTime) -> ProbeOutcome {
        if !schedule::is_due(target.schedule, target.last_run_at, now) {
            debug!(target = %target.name, "not due, skipping");
            return ProbeOutcome::skipped(&target, "not due yet");
        }

        let outcome = match build_request(&target) {
            Ok(request) => {
                let started = Instant::now();
                match self.client.issue(&request).await {
                    Ok(response) => {
                        let duration_ms = started.elapsed().as_millis() as u64;
                        let status = if response.ok { ProbeStatus::Ok } else { ProbeStatus::Error };
                        ProbeOutcome::completed(&target, status, response.status_code, duration_ms)
                    }
                    Err(e) => {
                        warn!(target = %target.name, "probe failed: {e:#}");
                        ProbeOutcome::failed(&target, format!("{e:#}"))
                    }
                }
            }
            // Request construction failed; no network call is attempted.
            Err(e) => {
                warn!(target = %target.name, "request construction failed: {e}");
                ProbeOutcome::failed(&target, e.to_string())
            }
        };

        // The attempt time is stamped even on failure so a broken target is
        // retried once per schedule window, not on every sweep. Only the
        // status fields are written back: the snapshot's definition is stale
        // by now if an edit raced this probe, and must not win.
        let record = ProbeRecord {
            last_run_at: SystemTime::now(),
            last_status: outcome.status.unwrap_or(ProbeStatus::Error),
            last_status_code: outcome.status_code,
            last_duration_ms: outcome.duration_ms,
        };

        if let Err(e) = self.store.record_probe(target.id, &record).await {
            error!(target = %target.name, "failed to persist probe result: {e:#}");
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::HeaderPair;
    use crate::database::repository::LibsqlTargetStore;
    use crate::database::initialize_database;
    use crate::monitoring::client::ProbeResponse;
    use crate::monitoring::request::RequestDescriptor;
    use crate::pool::{LibsqlManager, LibsqlPool};
    use crate::schedule::Schedule;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn create_test_store() -> Result<(Arc<dyn TargetStore>, TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();

        let db = libsql::Builder::new_local(&db_path).build().await?;
        let manager = LibsqlManager::new(db);
        let pool: LibsqlPool = deadpool::managed::Pool::builder(manager)
            .config(deadpool::managed::PoolConfig::default())
            .build()?;

        let conn = pool.get().await?;
        initialize_database(&conn).await?;

        Ok((Arc::new(LibsqlTargetStore::new_from_pool(pool)), temp_dir))
    }

    /// Scripted client: responses keyed by URL, anything else is a
    /// transport failure. Can optionally delete or edit a target while its
    /// probe is in flight, to simulate external mutations racing the sweep.
    struct MockProbeClient {
        responses: HashMap<String, ProbeResponse>,
        calls: AtomicUsize,
        delete_on_call: Option<(Arc<dyn TargetStore>, Uuid)>,
        reschedule_on_call: Option<(Arc<dyn TargetStore>, Uuid, Schedule)>,
    }

    impl MockProbeClient {
        fn new(responses: HashMap<String, ProbeResponse>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
                delete_on_call: None,
                reschedule_on_call: None,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProbeClient for MockProbeClient {
        async fn issue(&self, request: &RequestDescriptor) -> Result<ProbeResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((store, id)) = &self.delete_on_call {
                store.delete_by_id(*id).await?;
            }
            if let Some((store, id, schedule)) = &self.reschedule_on_call {
                if let Some(mut target) = store.get_by_id(*id).await? {
                    target.schedule = *schedule;
                    store.replace_by_id(*id, &target).await?;
                }
            }
            match self.responses.get(&request.url) {
                Some(response) => Ok(*response),
                None => Err(anyhow!("connection refused")),
            }
        }
    }

    fn url_target(name: &str, url: &str) -> Target {
        Target::new_url(name.to_string(), url.to_string(), Vec::new(), Schedule::Hourly)
    }

    #[tokio::test]
    async fn sweep_executes_due_and_skips_not_due() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        let due = url_target("due", "https://due.example.com");
        let mut fresh = url_target("fresh", "https://fresh.example.com");
        fresh.last_run_at = Some(SystemTime::now());
        store.append(&due).await?;
        store.append(&fresh).await?;

        let client = Arc::new(MockProbeClient::new(HashMap::from([(
            "https://due.example.com".to_string(),
            ProbeResponse { status_code: 200, ok: true },
        )])));
        let executor = ProbeExecutor::new(store.clone(), client.clone());

        let report = executor.run_sweep().await?;
        assert_eq!(report.total, 2);
        assert_eq!(report.executed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.executed + report.skipped, report.total);
        assert_eq!(client.call_count(), 1);

        let updated = store.get_by_id(due.id).await?.expect("still present");
        assert_eq!(updated.last_status, ProbeStatus::Ok);
        assert_eq!(updated.last_status_code, Some(200));
        assert!(updated.last_run_at.is_some());
        assert!(updated.last_duration_ms.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_curl_target_fails_without_network_call() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        let target = Target::new_curl("no-url".into(), "curl -X POST -d hi".into(), Schedule::Daily);
        store.append(&target).await?;

        let client = Arc::new(MockProbeClient::new(HashMap::new()));
        let executor = ProbeExecutor::new(store.clone(), client.clone());

        let report = executor.run_sweep().await?;
        assert_eq!(report.executed, 1);
        assert_eq!(client.call_count(), 0);

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.status, Some(ProbeStatus::Error));
        assert!(outcome.error.is_some());
        assert!(outcome.status_code.is_none());

        let updated = store.get_by_id(target.id).await?.expect("still present");
        assert_eq!(updated.last_status, ProbeStatus::Error);
        assert!(updated.last_status_code.is_none());
        assert!(updated.last_run_at.is_some(), "attempt time stamped on failure");
        Ok(())
    }

    #[tokio::test]
    async fn non_success_response_is_recorded_with_its_code() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        let target = url_target("failing", "https://failing.example.com");
        store.append(&target).await?;

        let client = Arc::new(MockProbeClient::new(HashMap::from([(
            "https://failing.example.com".to_string(),
            ProbeResponse { status_code: 503, ok: false },
        )])));
        let executor = ProbeExecutor::new(store.clone(), client);

        executor.run_sweep().await?;

        let updated = store.get_by_id(target.id).await?.expect("still present");
        assert_eq!(updated.last_status, ProbeStatus::Error);
        assert_eq!(updated.last_status_code, Some(503));
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_leaves_no_status_code() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        let target = url_target("unreachable", "https://unreachable.example.com");
        store.append(&target).await?;

        let client = Arc::new(MockProbeClient::new(HashMap::new()));
        let executor = ProbeExecutor::new(store.clone(), client);

        let report = executor.run_sweep().await?;
        assert_eq!(report.outcomes[0].status, Some(ProbeStatus::Error));
        assert!(report.outcomes[0].status_code.is_none());

        let updated = store.get_by_id(target.id).await?.expect("still present");
        assert_eq!(updated.last_status, ProbeStatus::Error);
        assert!(updated.last_status_code.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_during_sweep_is_not_resurrected() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        let target = url_target("doomed", "https://doomed.example.com");
        store.append(&target).await?;

        let mut client = MockProbeClient::new(HashMap::from([(
            "https://doomed.example.com".to_string(),
            ProbeResponse { status_code: 200, ok: true },
        )]));
        client.delete_on_call = Some((store.clone(), target.id));
        let executor = ProbeExecutor::new(store.clone(), Arc::new(client));

        let report = executor.run_sweep().await?;
        assert_eq!(report.executed, 1);

        assert!(store.get_by_id(target.id).await?.is_none(), "write-back must not resurrect");
        assert!(store.list().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn edit_during_probe_survives_the_write_back() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        let target = url_target("edited", "https://edited.example.com");
        store.append(&target).await?;

        let mut client = MockProbeClient::new(HashMap::from([(
            "https://edited.example.com".to_string(),
            ProbeResponse { status_code: 200, ok: true },
        )]));
        client.reschedule_on_call = Some((store.clone(), target.id, Schedule::Weekly));
        let executor = ProbeExecutor::new(store.clone(), Arc::new(client));

        executor.run_sweep().await?;

        // The probe result lands without reverting the concurrent edit.
        let loaded = store.get_by_id(target.id).await?.expect("still present");
        assert_eq!(loaded.schedule, Schedule::Weekly);
        assert_eq!(loaded.last_status, ProbeStatus::Ok);
        assert_eq!(loaded.last_status_code, Some(200));
        Ok(())
    }

    #[tokio::test]
    async fn every_target_failing_still_returns_a_report() -> Result<()> {
        let (store, _dir) = create_test_store().await?;

        store.append(&url_target("a", "https://a.example.com")).await?;
        store.append(&url_target("b", "https://b.example.com")).await?;

        let client = Arc::new(MockProbeClient::new(HashMap::new()));
        let executor = ProbeExecutor::new(store, client);

        let report = executor.run_sweep().await?;
        assert_eq!(report.total, 2);
        assert_eq!(report.executed, 2);
        assert!(report.outcomes.iter().all(|o| o.status == Some(ProbeStatus::Error)));
        Ok(())
    }

    #[test]
    fn url_mode_header_pairs_reach_the_request() {
        let mut target = url_target("headers", "https://h.example.com");
        target.headers = vec![
            HeaderPair { key: "X-Token".into(), value: "a".into() },
            HeaderPair { key: "X-Token".into(), value: "b".into() },
        ];
        let request = build_request(&target).expect("buildable");
        assert_eq!(request.headers["X-Token"], "b");
    }
}
