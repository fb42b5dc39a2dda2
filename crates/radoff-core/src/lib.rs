//! Poll coordination layer between `radoff-api` and host applications.
//!
//! This crate owns the polling state machine for one configured Radoff
//! cloud account:
//!
//! - **[`Coordinator`]** — owns a single [`radoff_api::CloudClient`],
//!   runs [`refresh()`](Coordinator::refresh) once at
//!   [`start()`](Coordinator::start) and then on a fixed interval,
//!   converts client failures into [`CoreError::UpdateFailed`], and
//!   publishes each successful poll as an atomic [`Snapshot`].
//!
//! - **[`Snapshot`]** — the latest complete device list with typed
//!   readings; replaced wholesale, never partially visible. Failed polls
//!   keep the previous snapshot readable as the last-known-good value.
//!
//! - **[`PollState`]** — a `watch`-based signal of per-cycle outcomes so
//!   hosts can surface failures without crashing.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod snapshot;

pub use config::{DEFAULT_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS, PollerConfig};
pub use coordinator::{Coordinator, PollState};
pub use error::CoreError;
pub use snapshot::{SOURCE_LABEL, Snapshot};
