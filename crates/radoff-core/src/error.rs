// ── Core error types ──
//
// Coordinator-facing errors. Client-level failures are never swallowed;
// they arrive here wrapped with enough context for the host to decide
// between "abort setup" and "log and keep the last snapshot".

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The very first refresh failed. There is no prior snapshot to fall
    /// back to, so setup of the owning integration must abort.
    #[error("initial refresh failed: {cause}")]
    SetupFailed {
        #[source]
        cause: radoff_api::Error,
    },

    /// A steady-state refresh cycle failed. The previous snapshot stays
    /// in place; the next scheduled poll is the retry.
    #[error("update failed: {cause}")]
    UpdateFailed {
        #[source]
        cause: radoff_api::Error,
    },

    /// The supplied configuration cannot produce a working client.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if this failure must abort integration setup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SetupFailed { .. } | Self::Config { .. })
    }
}
