use thiserror::Error;

/// Top-level error type for the `radoff-api` crate.
///
/// Covers every failure mode across the two API surfaces: the Cognito
/// identity provider (SRP exchange) and the Radoff cloud REST API.
/// `radoff-core` maps these into coordinator-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// A required credential is missing from the configuration.
    /// Not retried -- surfaced at setup time.
    #[error("Invalid authentication data: {message}")]
    AuthConfig { message: String },

    /// The identity provider rejected the SRP exchange
    /// (wrong username/password, disabled account, etc.)
    #[error("Authentication rejected: {message}")]
    InvalidCredentials { message: String },

    /// Authenticated, but no tenant domain matched the parent scope.
    #[error("No tenant domain found under the parent scope")]
    DomainNotFound,

    /// A bearer token was required but the session holds none.
    #[error("No bearer token available -- session not connected")]
    TokenMissing,

    /// The cloud API returned a non-200 status. The client has already
    /// run its reconnect-and-fail protocol by the time this is raised.
    #[error("API call failed with HTTP {status}")]
    ApiAuth { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The identity provider returned malformed SRP challenge material
    /// (bad hex, bad base64, zero scrambling parameter).
    #[error("SRP protocol error: {message}")]
    Srp { message: String },
}

impl Error {
    /// Returns `true` if this error means the stored configuration is
    /// unusable and re-trying the same call cannot succeed.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::AuthConfig { .. })
    }

    /// Returns `true` if this error indicates the session is stale or
    /// rejected and a later poll (with a fresh token) may recover.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. } | Self::ApiAuth { .. } | Self::TokenMissing
        )
    }
}
