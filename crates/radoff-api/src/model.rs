// ── Domain and wire types ──
//
// Domain types (`Device`, `SensorReading`) are immutable per fetch and
// fully owned by whoever holds the snapshot; wire types mirror the cloud
// API's JSON shapes and stay crate-private.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mapping::{MeasurementKind, NormalizeFn, SensorDescriptor};

/// One typed sensor reading, as mapped from a raw telemetry property.
///
/// Everything except `raw_value` is determined by the property name via
/// the static table in [`crate::mapping`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    /// The raw vendor field name (e.g. `"tvoc"`, `"pressure"`).
    pub key: String,
    /// The value exactly as reported on the wire.
    pub raw_value: f64,
    pub kind: MeasurementKind,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub normalize: Option<NormalizeFn>,
}

impl SensorReading {
    pub(crate) fn from_descriptor(key: String, raw_value: f64, d: SensorDescriptor) -> Self {
        Self {
            key,
            raw_value,
            kind: d.kind,
            label: d.label,
            unit: d.unit,
            normalize: d.normalize,
        }
    }

    /// The display value: the raw value with the normalization step
    /// applied when the raw encoding is not already in the target unit.
    pub fn value(&self) -> f64 {
        match self.normalize {
            Some(f) => f.apply(self.raw_value),
            None => self.raw_value,
        }
    }
}

/// A discovered device and its latest readings. Immutable per fetch --
/// a new poll produces new `Device` values, never mutates old ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Primary key within a session.
    pub device_id: String,
    /// Stable hardware identifier; the display layer's external key.
    pub device_serial: String,
    /// Model name; always one of the supported types after discovery.
    pub device_type: String,
    pub name: String,
    /// Latest readings, keyed by raw sensor key.
    pub sensors: HashMap<String, SensorReading>,
}

// ── Wire types ───────────────────────────────────────────────────────

/// `POST /data/devices/search` request body.
#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest {
    pub filter: serde_json::Map<String, serde_json::Value>,
    pub take: u32,
}

impl SearchRequest {
    /// The fixed discovery query: empty filter, first 99 devices.
    pub(crate) fn all() -> Self {
        Self { filter: serde_json::Map::new(), take: 99 }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub devices: Vec<WireDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDevice {
    pub id: String,
    pub serial: String,
    /// Absent on some fleet entries; those are never supported types.
    #[serde(default)]
    pub device_type_name: Option<String>,
    pub name: String,
}

/// `GET /data/devices/{id}` response: one or more named property groups
/// under a top-level `data` field.
#[derive(Debug, Deserialize)]
pub(crate) struct TelemetryResponse {
    pub data: TelemetryGroups,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TelemetryGroups {
    #[serde(default)]
    pub data: Vec<WireProperty>,
    #[serde(default, rename = "aggregatedData")]
    pub aggregated_data: Vec<WireProperty>,
}

/// One property object: a name plus either an instantaneous `value` or
/// an `aggregationValue`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProperty {
    pub property_name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub aggregation_value: Option<f64>,
}

impl WireProperty {
    /// Prefer the instantaneous value, fall back to the aggregate.
    pub(crate) fn reading(&self) -> Option<f64> {
        self.value.or(self.aggregation_value)
    }
}

/// `GET /auth/user/me/domains` response.
#[derive(Debug, Deserialize)]
pub(crate) struct DomainsResponse {
    pub domains: Vec<WireDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDomain {
    pub id: String,
    #[serde(default)]
    pub parent_domain_id: Option<String>,
}
