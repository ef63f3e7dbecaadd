//! PollingStore — store decorator that health-polls registered services.
//!
//! Each service with a health-check URL gets exactly one background task,
//! started either when the store is constructed (for services already in
//! the wrapped store) or on its first registration. The task polls
//! immediately and then on a fixed interval until the store is closed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use svcreg_store::{Service, ServiceStore, StoreResult};

use crate::checker::HealthClient;
use crate::error::{HealthError, HealthResult};

/// Derived liveness state for one service.
///
/// Exists only after the service's first poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub available: bool,
    pub last_checked: DateTime<Utc>,
    /// `None` until a poll succeeds.
    pub last_available: Option<DateTime<Utc>>,
    /// Number of completed polls.
    pub checks: u64,
}

type FreshnessMap = Arc<RwLock<HashMap<String, Freshness>>>;

/// Per-service poller state.
struct PollerSlot {
    /// Handle to the background poll task.
    handle: JoinHandle<()>,
    /// Shutdown signal for this poller.
    shutdown_tx: watch::Sender<bool>,
}

/// Running pollers by service URL. Once `closed` is set no new poller
/// is launched.
#[derive(Default)]
struct LaunchSet {
    slots: HashMap<String, PollerSlot>,
    closed: bool,
}

/// Health-polling decorator over any `ServiceStore`.
pub struct PollingStore<S> {
    inner: S,
    interval: Duration,
    client: HealthClient,
    runtime: Handle,
    /// Launch lock. Only touched on construction, registration and close.
    pollers: Mutex<LaunchSet>,
    /// State lock: written by poll tasks, read by `list`.
    freshness: FreshnessMap,
}

impl<S: ServiceStore> PollingStore<S> {
    /// Wrap `inner`, starting a poller for every monitored service it
    /// already holds.
    ///
    /// Must be called from within a tokio runtime; pollers are spawned
    /// onto that runtime.
    pub fn new(inner: S, interval: Duration) -> HealthResult<Self> {
        Self::with_client(inner, interval, HealthClient::new()?)
    }

    /// Like [`new`](Self::new), probing through `client`.
    pub fn with_client(inner: S, interval: Duration, client: HealthClient) -> HealthResult<Self> {
        if interval.is_zero() {
            return Err(HealthError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| HealthError::NoRuntime)?;
        let existing = inner.list()?;

        let store = Self {
            inner,
            interval,
            client,
            runtime,
            pollers: Mutex::new(LaunchSet::default()),
            freshness: Arc::new(RwLock::new(HashMap::new())),
        };

        {
            let mut pollers = store.pollers.lock();
            for service in existing.iter().filter(|s| s.is_monitored()) {
                store.launch(&mut pollers, &service.service_url, &service.healthcheck_url);
            }
            info!(
                resumed = pollers.slots.len(),
                interval = ?interval,
                "polling store initialized"
            );
        }

        Ok(store)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Service URLs with a running poller.
    pub fn active_pollers(&self) -> Vec<String> {
        self.pollers.lock().slots.keys().cloned().collect()
    }

    /// Whether a poller is running for `service_url`.
    pub fn is_polling(&self, service_url: &str) -> bool {
        self.pollers.lock().slots.contains_key(service_url)
    }

    /// Latest poll state for `service_url`, if it has been polled.
    pub fn freshness(&self, service_url: &str) -> Option<Freshness> {
        self.freshness.read().get(service_url).copied()
    }

    /// Start a poller unless one is already running or the store is
    /// closed. Caller holds the launch lock for the whole check-and-spawn.
    fn launch(&self, pollers: &mut LaunchSet, service_url: &str, healthcheck_url: &str) {
        if pollers.closed {
            debug!(%service_url, "store closed, poller not started");
            return;
        }
        if pollers.slots.contains_key(service_url) {
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = self.runtime.spawn(run_poll_loop(
            service_url.to_string(),
            healthcheck_url.to_string(),
            self.interval,
            self.client.clone(),
            Arc::clone(&self.freshness),
            shutdown_rx,
        ));

        pollers.slots.insert(
            service_url.to_string(),
            PollerSlot {
                handle,
                shutdown_tx,
            },
        );
        info!(%service_url, %healthcheck_url, "health poller started");
    }
}

impl<S> PollingStore<S> {
    /// Stop every poller and refuse to start new ones. Freshness already
    /// recorded stays readable.
    pub fn stop_all(&self) {
        let mut pollers = self.pollers.lock();
        pollers.closed = true;
        if pollers.slots.is_empty() {
            return;
        }
        for (service_url, slot) in pollers.slots.drain() {
            let _ = slot.shutdown_tx.send(true);
            slot.handle.abort();
            debug!(%service_url, "health poller stopped");
        }
        info!("all health pollers stopped");
    }
}

impl<S: ServiceStore> ServiceStore for PollingStore<S> {
    /// The wrapped store always sees the write. The launch check runs
    /// afterwards whatever the write returned, once per service URL, and
    /// the wrapped store's result is passed back unchanged.
    fn register(&self, service: Service) -> StoreResult<()> {
        let target = service
            .is_monitored()
            .then(|| (service.service_url.clone(), service.healthcheck_url.clone()));

        let result = self.inner.register(service);

        if let Some((service_url, healthcheck_url)) = target {
            let mut pollers = self.pollers.lock();
            self.launch(&mut pollers, &service_url, &healthcheck_url);
        }
        result
    }

    /// Overlay freshness onto the wrapped store's records.
    ///
    /// The inner store hands back owned records, so the overlay edits
    /// copies and nothing reaches persistence.
    fn list(&self) -> StoreResult<Vec<Service>> {
        let mut services = self.inner.list()?;

        let freshness = self.freshness.read();
        for service in &mut services {
            if let Some(state) = freshness.get(&service.service_url) {
                service.available = state.available;
                service.last_checked = Some(state.last_checked);
                service.last_available = state.last_available;
            }
        }

        Ok(services)
    }

    fn close(&self) -> StoreResult<()> {
        self.stop_all();
        self.inner.close()
    }

    fn describe(&self) -> String {
        format!("polling ({:?}) around {}", self.interval, self.inner.describe())
    }
}

impl<S> Drop for PollingStore<S> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Poll loop for a single service. The first tick fires immediately.
async fn run_poll_loop(
    service_url: String,
    healthcheck_url: String,
    period: Duration,
    client: HealthClient,
    freshness: FreshnessMap,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(%service_url, %healthcheck_url, "poll loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let result = client.probe(&healthcheck_url).await;
                record_poll(&freshness, &service_url, result.is_healthy(), Utc::now());
                debug!(%service_url, ?result, "health polled");
            }
            _ = shutdown.changed() => {
                debug!(%service_url, "poll loop shutting down");
                break;
            }
        }
    }
}

/// Apply one poll outcome. All fields change under a single write lock.
fn record_poll(
    freshness: &RwLock<HashMap<String, Freshness>>,
    service_url: &str,
    success: bool,
    now: DateTime<Utc>,
) {
    let mut map = freshness.write();
    let state = map.entry(service_url.to_string()).or_insert(Freshness {
        available: false,
        last_checked: now,
        last_available: None,
        checks: 0,
    });
    state.available = success;
    state.last_checked = now;
    state.checks += 1;
    if success {
        state.last_available = Some(now);
    }
}
