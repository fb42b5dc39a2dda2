// radoff-api: Async Rust client for the Radoff IoT cloud (SRP auth + telemetry)

pub mod client;
pub mod error;
pub mod mapping;
pub mod model;

mod auth;
mod srp;

pub use client::{BASE_URL, CloudClient, Credentials, DEFAULT_TIMEOUT, PARENT_DOMAIN};
pub use error::Error;
pub use mapping::{
    MeasurementKind, NormalizeFn, SUPPORTED_DEVICE_TYPES, SensorDescriptor, TelemetryGroup,
};
pub use model::{Device, SensorReading};
