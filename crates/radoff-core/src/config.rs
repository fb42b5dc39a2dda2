// ── Poller configuration ──
//
// Describes *how* to poll the cloud: account credentials plus the
// refresh cadence. Built by the host (CLI, integration layer) and handed
// to the Coordinator -- core never reads config files itself.

use std::time::Duration;

use radoff_api::Credentials;
use secrecy::SecretString;

/// Default poll interval when the host does not override it.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Hard floor for the poll interval; lower values are clamped.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Configuration for one polling instance.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub username: String,
    pub password: SecretString,
    pub client_id: String,
    pub pool_id: String,
    pub pool_region: String,
    /// Requested poll interval in seconds. Clamped to the minimum; see
    /// [`PollerConfig::poll_interval`].
    pub poll_interval_secs: u64,
}

impl PollerConfig {
    /// The effective poll interval: the configured value, floored at
    /// [`MIN_POLL_INTERVAL_SECS`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    /// The credential record the API client consumes.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            client_id: self.client_id.clone(),
            pool_id: self.pool_id.clone(),
            pool_region: self.pool_region.clone(),
        }
    }
}
