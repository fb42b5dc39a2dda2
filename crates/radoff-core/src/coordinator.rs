// ── Poll coordinator ──
//
// Owns exactly one CloudClient and drives it: one refresh at startup,
// then one per interval tick, never overlapping. Successful polls
// replace the published snapshot atomically; failed polls leave the
// previous snapshot in place and flip the observable state to Failed.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use radoff_api::{CloudClient, Device};

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::snapshot::Snapshot;

/// Poll lifecycle state observable by consumers.
///
/// `Uninitialized` only exists before the first refresh completes; after
/// that the coordinator alternates between `Ready` and `Failed` per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Uninitialized,
    Ready,
    Failed { message: String },
}

/// The coordinator. Cheaply cloneable via `Arc`; all clones share one
/// client, one snapshot slot, and one state channel.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: PollerConfig,
    /// The single owned client. The lock also serializes refreshes,
    /// including snapshot publication: a second `refresh()` cannot
    /// start or publish while one is in flight.
    client: Mutex<CloudClient>,
    snapshot: ArcSwapOption<Snapshot>,
    state: watch::Sender<PollState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator against the production endpoints.
    /// Does not poll -- call [`start()`](Self::start).
    pub fn new(config: PollerConfig) -> Result<Self, CoreError> {
        let client = CloudClient::new(config.credentials())
            .map_err(|e| CoreError::Config { message: e.to_string() })?;
        Ok(Self::with_client(config, client))
    }

    /// Create a coordinator around a pre-built client (tests, custom
    /// endpoints).
    pub fn with_client(config: PollerConfig, client: CloudClient) -> Self {
        let (state, _) = watch::channel(PollState::Uninitialized);
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client: Mutex::new(client),
                snapshot: ArcSwapOption::empty(),
                state,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Access the poller configuration.
    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the first refresh, then spawn the periodic refresh task.
    ///
    /// A first-refresh failure is fatal (there is no snapshot to fall
    /// back to) and propagates as [`CoreError::SetupFailed`].
    pub async fn start(&self) -> Result<(), CoreError> {
        self.refresh().await?;

        let interval = self.inner.config.poll_interval();
        info!(interval_secs = interval.as_secs(), "starting periodic refresh");

        let handle = tokio::spawn(refresh_task(
            self.clone(),
            interval,
            self.inner.cancel.child_token(),
        ));
        *self.inner.task.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the periodic task and drop the session.
    ///
    /// An in-flight refresh is allowed to finish; the per-call network
    /// timeout bounds how long that can take.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
        self.inner.client.lock().await.disconnect();
        debug!("coordinator shut down");
    }

    /// Run one poll cycle; the sole state-machine transition driver.
    ///
    /// Connects if the session is down, lists devices (each with fresh
    /// telemetry), and publishes the new snapshot. On failure the
    /// previous snapshot -- if any -- remains readable.
    ///
    /// The client lock is held through publication, so concurrent
    /// `refresh()` calls store their snapshots in completion order.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        debug!("refresh cycle starting");

        let mut client = self.inner.client.lock().await;
        let outcome = if client.connected() {
            client.list_devices().await
        } else {
            match client.connect().await {
                Ok(()) => client.list_devices().await,
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(devices) => {
                debug!(devices = devices.len(), "refresh succeeded");
                self.inner.snapshot.store(Some(Arc::new(Snapshot::new(devices))));
                let _ = self.inner.state.send(PollState::Ready);
                Ok(())
            }
            Err(cause) => {
                let _ = self
                    .inner
                    .state
                    .send(PollState::Failed { message: cause.to_string() });

                if self.inner.snapshot.load().is_none() {
                    Err(CoreError::SetupFailed { cause })
                } else {
                    warn!(error = %cause, "refresh failed, keeping last snapshot");
                    Err(CoreError::UpdateFailed { cause })
                }
            }
        }
    }

    // ── Read side ────────────────────────────────────────────────────

    /// The latest successful snapshot, or `None` before the first success.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Re-resolve a device handle in the latest snapshot.
    pub fn get_device_by_id(&self, device_type: &str, device_id: &str) -> Option<Device> {
        self.snapshot()?
            .device_by_id(device_type, device_id)
            .cloned()
    }

    /// Subscribe to poll state transitions, including per-cycle failures.
    pub fn state(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }
}

/// Background task: one refresh per tick until cancelled. Ticks are
/// delayed, not bunched, when a refresh overruns the interval.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}
