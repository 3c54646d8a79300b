// ── Polling coordinator ──
//
// Owns the cloud client, the published snapshot and the lock table.
// Drives the periodic refresh cycle, bounds each cycle with a timeout,
// classifies failures, and halts polling on authentication errors until
// credentials are re-established.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use openly_api::{Credentials, RentlyClient};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cloud::CloudClient;
use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::hub::HubController;
use crate::lock::LockController;
use crate::model::DeviceId;
use crate::store::{LockRead, LockTable, Snapshot, SnapshotBuilder};
use crate::stream::SnapshotStream;

// ── PollState ────────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Created; the first refresh has not succeeded yet.
    Starting,
    /// Polling normally.
    Ready,
    /// Credentials were rejected. No cycles run until `reauthenticate`.
    Halted { reason: String },
    /// Shut down.
    Stopped,
}

// ── PollingCoordinator ───────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Controllers handed out by
/// [`lock_controller`](Self::lock_controller) and [`hub`](Self::hub) hold
/// a clone and route every call back through it.
pub struct PollingCoordinator<C: CloudClient> {
    inner: Arc<CoordinatorInner<C>>,
}

impl<C: CloudClient> Clone for PollingCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<C> {
    config: CoordinatorConfig,
    cloud: C,
    snapshot: watch::Sender<Arc<Snapshot>>,
    state: watch::Sender<PollState>,
    locks: LockTable,
    /// Held for the duration of a cycle. Cycles never overlap.
    cycle_gate: Mutex<()>,
    cancel: CancellationToken,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl<C: CloudClient> PollingCoordinator<C> {
    /// Create a coordinator around an already logged-in client. Does NOT
    /// refresh; see [`initialize`](Self::initialize) for the full setup.
    pub fn new(cloud: C, config: CoordinatorConfig) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty()));
        let (state, _) = watch::channel(PollState::Starting);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                cloud,
                snapshot,
                state,
                locks: LockTable::new(),
                cycle_gate: Mutex::new(()),
                cancel: CancellationToken::new(),
                scheduler: Mutex::new(None),
            }),
        }
    }

    /// Log in, run the first refresh, and start the schedule.
    ///
    /// Empty credential fields and unreachable endpoints fail with
    /// `CannotConnect`; rejected credentials with `AuthFailed`. A failing
    /// first refresh is returned as-is and nothing keeps running.
    pub async fn initialize(
        cloud: C,
        credentials: &Credentials,
        config: CoordinatorConfig,
    ) -> Result<Self, CoreError> {
        credentials.validate().map_err(CoreError::from_setup)?;
        cloud
            .login(&credentials.email, &credentials.password)
            .await
            .map_err(CoreError::from_setup)?;
        info!(email = %credentials.email, "logged in to keyless cloud");

        let coordinator = Self::new(cloud, config);
        coordinator.first_refresh().await?;
        coordinator.start().await;
        Ok(coordinator)
    }

    /// One-shot: initialize without a schedule, run closure, shut down.
    pub async fn oneshot<F, Fut, T>(
        cloud: C,
        credentials: &Credentials,
        config: CoordinatorConfig,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(PollingCoordinator<C>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll_interval = Duration::ZERO;

        let coordinator = Self::initialize(cloud, credentials, cfg).await?;
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub(crate) fn cloud(&self) -> &C {
        &self.inner.cloud
    }

    pub(crate) fn lock_table(&self) -> &LockTable {
        &self.inner.locks
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// The refresh that must succeed before the coordinator is `Ready`.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let snapshot = self.refresh().await?;
        self.inner.state.send_replace(PollState::Ready);
        info!(
            hubs = snapshot.hubs().len(),
            locks = snapshot.lock_count(),
            "coordinator ready"
        );
        Ok(snapshot)
    }

    /// Spawn the periodic refresh task. No-op when the poll interval is
    /// zero or the task is already running.
    pub async fn start(&self) {
        let period = self.inner.config.poll_interval;
        if period.is_zero() {
            debug!("poll interval is zero; scheduled refresh disabled");
            return;
        }

        let mut scheduler = self.inner.scheduler.lock().await;
        if scheduler.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let cancel = self.inner.cancel.child_token();
        *scheduler = Some(tokio::spawn(refresh_task(self.clone(), period, cancel)));
        debug!(interval_secs = period.as_secs(), "scheduled refresh started");
    }

    /// Log in again after `AuthFailed` and resume polling.
    ///
    /// Runs a refresh straight away and returns its outcome; the schedule
    /// resumes even when that refresh fails transiently.
    pub async fn reauthenticate(&self, credentials: &Credentials) -> Result<Arc<Snapshot>, CoreError> {
        credentials.validate().map_err(CoreError::from_setup)?;
        self.inner
            .cloud
            .login(&credentials.email, &credentials.password)
            .await?;
        info!(email = %credentials.email, "re-authenticated; resuming polling");

        self.inner.state.send_replace(PollState::Ready);
        self.start().await;
        self.refresh().await
    }

    /// Stop the schedule and every snapshot listener.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let scheduler = self.inner.scheduler.lock().await.take();
        if let Some(handle) = scheduler {
            let _ = handle.await;
        }

        self.inner.state.send_replace(PollState::Stopped);
        debug!("coordinator stopped");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run one cycle now, waiting for any cycle already in flight.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        if self.is_halted() {
            return Err(CoreError::PollingHalted);
        }
        let _gate = self.inner.cycle_gate.lock().await;
        self.run_cycle().await
    }

    /// Scheduled tick. Returns `false` when polling is halted.
    async fn scheduled_tick(&self) -> bool {
        if self.is_halted() {
            return false;
        }
        let Ok(_gate) = self.inner.cycle_gate.try_lock() else {
            debug!("previous cycle still running; skipping tick");
            return true;
        };

        match self.run_cycle().await {
            Ok(_) => true,
            Err(e) if e.is_auth_failure() => false,
            Err(e @ CoreError::Timeout { .. }) => {
                warn!(error = %e, "scheduled refresh timed out; keeping previous snapshot");
                true
            }
            Err(e) => {
                warn!(error = %e, "scheduled refresh failed; keeping previous snapshot");
                true
            }
        }
    }

    /// One cycle under the timeout. Caller holds the gate.
    async fn run_cycle(&self) -> Result<Arc<Snapshot>, CoreError> {
        let cycle = self.inner.snapshot.borrow().cycle + 1;
        let seq = self.inner.locks.begin_read();
        let limit = self.inner.config.refresh_timeout;

        let result = match tokio::time::timeout(limit, self.fetch(cycle)).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: limit.as_secs(),
            }),
        };

        match result {
            Ok((snapshot, reads)) => Ok(self.publish(seq, snapshot, reads)),
            Err(e) => {
                if e.is_auth_failure() {
                    self.halt(&e);
                }
                Err(e)
            }
        }
    }

    /// Hubs first, then each hub's devices in listing order.
    async fn fetch(&self, cycle: u64) -> Result<(Snapshot, Vec<LockRead>), CoreError> {
        let listing = self.inner.cloud.list_hubs().await?;
        let hubs = listing
            .hubs
            .filter(|hubs| !hubs.is_empty())
            .ok_or(CoreError::NoHubsFound)?;
        if hubs
            .iter()
            .any(|h| h.id.as_deref().is_none_or(str::is_empty))
        {
            return Err(CoreError::NoHubsFound);
        }

        let mut builder = SnapshotBuilder::new();
        for hub in hubs {
            let hub_id = hub.id.clone().unwrap_or_default();
            let devices = self.inner.cloud.list_devices(&hub_id).await?;
            debug!(hub = %hub_id, devices = devices.len(), "fetched hub devices");
            if !builder.push_hub(hub, devices) {
                return Err(CoreError::NoHubsFound);
            }
        }

        Ok(builder.build(cycle, Utc::now()))
    }

    /// Reconcile locks, then swap the snapshot in.
    fn publish(&self, seq: u64, snapshot: Snapshot, reads: Vec<LockRead>) -> Arc<Snapshot> {
        let locks = &self.inner.locks;
        let listed: HashSet<DeviceId> = reads
            .iter()
            .map(|r| DeviceId::from(r.record.id.as_str()))
            .collect();

        for read in reads {
            if !locks.apply_read(seq, &read.record, Some(read.hub_id)) {
                debug!(device = %read.record.id, "command in flight; keeping optimistic status");
            }
        }
        locks.retain(&listed);

        let snapshot = Arc::new(snapshot);
        self.inner.snapshot.send_replace(Arc::clone(&snapshot));
        debug!(
            cycle = snapshot.cycle,
            hubs = snapshot.hubs().len(),
            devices = snapshot.devices().len(),
            locks = snapshot.lock_count(),
            "snapshot published"
        );
        snapshot
    }

    fn halt(&self, err: &CoreError) {
        error!(error = %err, "authentication failed; polling halted until re-authentication");
        self.inner.state.send_replace(PollState::Halted {
            reason: err.to_string(),
        });
    }

    fn is_halted(&self) -> bool {
        matches!(*self.inner.state.borrow(), PollState::Halted { .. })
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> PollState {
        self.inner.state.borrow().clone()
    }

    /// Ticks on every change to any lock's local state.
    pub fn lock_updates(&self) -> watch::Receiver<u64> {
        self.inner.locks.subscribe()
    }

    // ── Snapshot access ──────────────────────────────────────────

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot.subscribe())
    }

    /// Run `callback` after each successful cycle until shutdown.
    pub fn on_snapshot_updated<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(Arc<Snapshot>) + Send + 'static,
    {
        let mut rx = self.inner.snapshot.subscribe();
        let cancel = self.inner.cancel.child_token();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = rx.borrow_and_update().clone();
                        callback(snapshot);
                    }
                }
            }
        })
    }

    // ── Controllers ──────────────────────────────────────────────

    /// Controllers for every tracked lock, sorted by id.
    pub fn locks(&self) -> Vec<LockController<C>> {
        self.inner
            .locks
            .ids()
            .into_iter()
            .map(|id| LockController::new(self.clone(), id))
            .collect()
    }

    /// Controller for one lock. Operations on a lock no poll has listed
    /// fail with `DeviceNotFound`.
    pub fn lock_controller(&self, device_id: impl Into<DeviceId>) -> LockController<C> {
        LockController::new(self.clone(), device_id.into())
    }

    /// Controllers for every hub in the current snapshot.
    pub fn hubs(&self) -> Vec<HubController<C>> {
        self.snapshot()
            .hubs()
            .iter()
            .map(|hub| HubController::new(self.clone(), hub.id.clone()))
            .collect()
    }

    /// Controller for one hub, if the current snapshot lists it.
    pub fn hub(&self, hub_id: &str) -> Option<HubController<C>> {
        let snapshot = self.snapshot();
        let hub = snapshot.hub(hub_id)?;
        Some(HubController::new(self.clone(), hub.id.clone()))
    }

    // ── Commands ─────────────────────────────────────────────────

    pub async fn lock(&self, device_id: &str) -> Result<(), CoreError> {
        self.lock_controller(device_id).lock().await
    }

    pub async fn unlock(&self, device_id: &str) -> Result<(), CoreError> {
        self.lock_controller(device_id).unlock().await
    }
}

impl PollingCoordinator<RentlyClient> {
    /// Build the production HTTP client from `config` and initialize.
    pub async fn connect(
        credentials: &Credentials,
        config: CoordinatorConfig,
    ) -> Result<Self, CoreError> {
        let api_url = config.api_url().map_err(|e| CoreError::Config {
            message: format!("invalid API URL: {e}"),
        })?;
        let login_url = config.login_url().map_err(|e| CoreError::Config {
            message: format!("invalid login URL: {e}"),
        })?;
        let client = RentlyClient::new(api_url, login_url, &config.transport())
            .map_err(CoreError::from_setup)?;

        Self::initialize(client, credentials, config).await
    }
}

/// Periodically refresh until cancelled. Parks while halted.
async fn refresh_task<C: CloudClient>(
    coordinator: PollingCoordinator<C>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let started = tokio::time::Instant::now();
                let keep_polling = coordinator.scheduled_tick().await;
                // A cycle that outlived the period leaves a tick pending.
                if started.elapsed() >= period {
                    interval.reset();
                }
                if keep_polling {
                    continue;
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    resumed = wait_until_resumed(coordinator.state()) => {
                        if !resumed {
                            break;
                        }
                        interval.reset();
                    }
                }
            }
        }
    }
}

async fn wait_until_resumed(mut state: watch::Receiver<PollState>) -> bool {
    state
        .wait_for(|s| !matches!(s, PollState::Halted { .. }))
        .await
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use secrecy::SecretString;

    use super::*;
    use crate::testing::{FakeCloud, FakeError, Step, hub_record, lock_record, other_record};

    fn credentials(password: &str) -> Credentials {
        Credentials::new("me@example.com", SecretString::from(password.to_owned()))
    }

    fn manual() -> CoordinatorConfig {
        CoordinatorConfig {
            poll_interval: Duration::ZERO,
            ..CoordinatorConfig::default()
        }
    }

    fn two_hubs() -> FakeCloud {
        FakeCloud::new()
            .with_hub(
                "hub-1",
                vec![lock_record("lock-1", "unlocked"), other_record("thermo-1", "thermostat")],
            )
            .with_hub("hub-2", vec![lock_record("lock-2", "locked")])
    }

    // ── Setup ────────────────────────────────────────────────────

    #[tokio::test]
    async fn initialize_publishes_first_snapshot_and_is_ready() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::initialize(cloud.clone(), &credentials("pw"), manual())
            .await
            .unwrap();

        assert_eq!(coordinator.current_state(), PollState::Ready);
        assert_eq!(coordinator.snapshot().cycle, 1);
        assert_eq!(cloud.login_calls(), 1);
    }

    #[tokio::test]
    async fn initialize_with_empty_password_cannot_connect() {
        let cloud = two_hubs();
        let result = PollingCoordinator::initialize(cloud.clone(), &credentials(""), manual()).await;

        assert!(matches!(result, Err(CoreError::CannotConnect { .. })));
        assert_eq!(cloud.login_calls(), 0);
        assert_eq!(cloud.list_hub_calls(), 0);
    }

    #[tokio::test]
    async fn initialize_with_rejected_password_is_auth_failed() {
        let cloud = two_hubs().with_password("right");
        let result = PollingCoordinator::initialize(cloud, &credentials("wrong"), manual()).await;

        assert!(matches!(result, Err(CoreError::AuthFailed { .. })));
    }

    #[tokio::test]
    async fn initialize_during_cloud_outage_cannot_connect() {
        let cloud = two_hubs();
        cloud.fail_login(Some(FakeError::Server));
        let result = PollingCoordinator::initialize(cloud.clone(), &credentials("pw"), manual()).await;

        assert!(matches!(result, Err(CoreError::CannotConnect { .. })));
        assert_eq!(cloud.login_calls(), 1);
        assert_eq!(cloud.list_hub_calls(), 0);
    }

    #[tokio::test]
    async fn initialize_returns_first_refresh_error() {
        let cloud = FakeCloud::new();
        let result = PollingCoordinator::initialize(cloud, &credentials("pw"), manual()).await;

        assert!(matches!(result, Err(CoreError::NoHubsFound)));
    }

    #[tokio::test]
    async fn oneshot_runs_closure_and_stops() {
        let cloud = two_hubs();
        let hubs = PollingCoordinator::oneshot(cloud, &credentials("pw"), manual(), |c| async move {
            let state = c.state();
            Ok((c.snapshot().hubs().len(), state))
        })
        .await
        .unwrap();

        assert_eq!(hubs.0, 2);
        assert_eq!(*hubs.1.borrow(), PollState::Stopped);
    }

    // ── Cycle contents ───────────────────────────────────────────

    #[tokio::test]
    async fn snapshot_holds_exactly_the_cycle_data() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());
        let first = coordinator.refresh().await.unwrap();

        let ids: Vec<_> = first.devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["lock-1", "thermo-1", "lock-2"]);
        assert_eq!(first.lock_count(), 2);

        cloud.remove_device("hub-2", "lock-2");
        let second = coordinator.refresh().await.unwrap();

        assert_eq!(second.cycle, 2);
        assert!(second.device("lock-2").is_none());
        assert!(!coordinator.lock_controller("lock-2").is_available());
        assert_eq!(coordinator.locks().len(), 1);
    }

    #[tokio::test]
    async fn empty_listing_keeps_previous_snapshot() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());
        let before = coordinator.refresh().await.unwrap();

        for hubs in [Some(Vec::new()), None] {
            cloud.set_hubs(hubs);
            let err = coordinator.refresh().await.unwrap_err();
            assert!(matches!(err, CoreError::NoHubsFound));
            assert!(err.is_transient());
            assert!(Arc::ptr_eq(&before, &coordinator.snapshot()));
        }
    }

    #[tokio::test]
    async fn hub_without_id_fails_whole_cycle() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());
        coordinator.refresh().await.unwrap();
        let device_calls = cloud.list_device_calls();

        cloud.set_hubs(Some(vec![hub_record("hub-1"), openly_api::HubRecord::default()]));
        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::NoHubsFound));
        assert_eq!(cloud.list_device_calls(), device_calls);
        assert_eq!(coordinator.snapshot().cycle, 1);
    }

    #[tokio::test]
    async fn invalid_response_is_transient_and_keeps_snapshot() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());
        coordinator.refresh().await.unwrap();

        cloud.push_step(Step::Fail(FakeError::Invalid));
        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::TransientFetch { .. }));
        assert_eq!(coordinator.snapshot().cycle, 1);
        assert!(!matches!(
            coordinator.current_state(),
            PollState::Halted { .. }
        ));
    }

    #[tokio::test]
    async fn snapshot_listener_fires_per_successful_cycle() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let listener = coordinator.on_snapshot_updated(move |snap| {
            sink.lock().unwrap().push(snap.cycle);
        });

        coordinator.refresh().await.unwrap();
        tokio::task::yield_now().await;
        cloud.push_step(Step::Fail(FakeError::Server));
        let _ = coordinator.refresh().await;
        coordinator.refresh().await.unwrap();
        tokio::task::yield_now().await;

        coordinator.shutdown().await;
        listener.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn subscription_sees_new_snapshot() {
        let coordinator = PollingCoordinator::new(two_hubs(), manual());
        let mut stream = coordinator.subscribe();
        assert_eq!(stream.current().cycle, 0);

        coordinator.refresh().await.unwrap();
        let next = stream.changed().await.unwrap();
        assert_eq!(next.cycle, 1);
    }

    // ── Timeout and schedule ─────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn slow_cycle_times_out_and_keeps_snapshot() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());
        coordinator.refresh().await.unwrap();

        cloud.push_step(Step::Delay(Duration::from_secs(11)));
        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::Timeout { timeout_secs: 10 }));
        assert!(err.is_transient());
        assert_eq!(coordinator.snapshot().cycle, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_runs_at_interval_and_survives_timeout() {
        let cloud = two_hubs();
        let config = CoordinatorConfig::default();
        let coordinator = PollingCoordinator::new(cloud.clone(), config);
        coordinator.first_refresh().await.unwrap();
        coordinator.start().await;
        assert_eq!(cloud.list_hub_calls(), 1);

        // t=30: times out at t=40
        cloud.push_step(Step::Delay(Duration::from_secs(15)));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(cloud.list_hub_calls(), 2);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(coordinator.snapshot().cycle, 1);

        // t=60: next cycle on the normal period
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(cloud.list_hub_calls(), 3);
        assert_eq!(coordinator.snapshot().cycle, 2);

        coordinator.shutdown().await;
        assert_eq!(coordinator.current_state(), PollState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_tick_skipped_while_on_demand_refresh_runs() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), CoordinatorConfig::default());
        coordinator.first_refresh().await.unwrap();
        coordinator.start().await;

        // t=28: two hubs at 4s each hold the gate until t=36
        tokio::time::sleep(Duration::from_secs(28)).await;
        cloud.set_device_delay(Some(Duration::from_secs(4)));
        let on_demand = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh().await })
        };
        while cloud.list_hub_calls() < 2 {
            tokio::task::yield_now().await;
        }

        // t=30 tick finds the gate held and is dropped, not deferred
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(cloud.list_hub_calls(), 2);
        let refreshed = on_demand.await.unwrap().unwrap();
        assert_eq!(refreshed.cycle, 2);
        cloud.set_device_delay(None);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(cloud.list_hub_calls(), 2);

        // t=60: schedule carries on
        tokio::time::sleep(Duration::from_secs(24)).await;
        assert_eq!(cloud.list_hub_calls(), 3);
        assert_eq!(coordinator.snapshot().cycle, 3);

        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_cycle_waits_a_full_period_before_the_next() {
        let cloud = two_hubs();
        let config = CoordinatorConfig {
            poll_interval: Duration::from_secs(5),
            refresh_timeout: Duration::from_secs(10),
            ..CoordinatorConfig::default()
        };
        let coordinator = PollingCoordinator::new(cloud.clone(), config);
        coordinator.first_refresh().await.unwrap();
        coordinator.start().await;

        // t=5: cycle runs until t=13, past the t=10 deadline
        cloud.push_step(Step::Delay(Duration::from_secs(8)));
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(cloud.list_hub_calls(), 2);

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(coordinator.snapshot().cycle, 2);
        assert_eq!(cloud.list_hub_calls(), 2);

        // t=18: one period after the overrun finished
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cloud.list_hub_calls(), 3);

        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_halts_schedule_until_reauthenticated() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), CoordinatorConfig::default());
        coordinator.first_refresh().await.unwrap();
        coordinator.start().await;

        cloud.push_step(Step::Fail(FakeError::Auth));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(matches!(coordinator.current_state(), PollState::Halted { .. }));
        assert_eq!(cloud.list_hub_calls(), 2);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(cloud.list_hub_calls(), 2);
        assert!(matches!(
            coordinator.refresh().await,
            Err(CoreError::PollingHalted)
        ));

        let snapshot = coordinator.reauthenticate(&credentials("pw")).await.unwrap();
        assert_eq!(snapshot.cycle, 2);
        assert_eq!(coordinator.current_state(), PollState::Ready);
        assert_eq!(cloud.list_hub_calls(), 3);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(cloud.list_hub_calls(), 4);

        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn on_demand_refresh_waits_for_running_cycle() {
        let cloud = two_hubs();
        let coordinator = PollingCoordinator::new(cloud.clone(), manual());

        cloud.set_device_delay(Some(Duration::from_secs(2)));
        let background = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh().await })
        };
        while cloud.list_device_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let second = coordinator.refresh().await.unwrap();
        let first = background.await.unwrap().unwrap();
        assert_eq!(first.cycle, 1);
        assert_eq!(second.cycle, 2);
    }
}
