// ── Static sensor mapping ──
//
// The vendor reports telemetry as flat property lists keyed by raw field
// name. This module is the single source of truth for turning a raw field
// into a typed reading: measurement kind, display label, unit, and the
// optional normalization step are all determined here, never ad hoc.

use serde::{Deserialize, Serialize};

/// What a sensor reading measures, normalized across all device models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MeasurementKind {
    VolatileOrganicCompounds,
    CarbonDioxide,
    Pm10,
    Pm25,
    Pm1,
    Temperature,
    Humidity,
    Pressure,
    AirQualityIndex,
}

/// Named pure normalization functions, selected by tag from the static
/// table. Keeping these as an enum (rather than function values embedded
/// in the table) keeps the table plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum NormalizeFn {
    /// The vendor encodes temperature in a proprietary raw scale:
    /// `celsius = raw * 0.00835`, rounded to one decimal.
    RawTemperature,
}

impl NormalizeFn {
    /// Apply the normalization to a raw value. Pure and deterministic.
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Self::RawTemperature => (raw * 0.00835 * 10.0).round() / 10.0,
        }
    }
}

/// Display metadata for one raw sensor key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDescriptor {
    pub kind: MeasurementKind,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub normalize: Option<NormalizeFn>,
}

/// The named property groups a telemetry response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryGroup {
    /// Instantaneous readings (`"data"`).
    Data,
    /// Server-side aggregates (`"aggregatedData"`).
    Aggregated,
}

impl TelemetryGroup {
    /// The group's field name on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Aggregated => "aggregatedData",
        }
    }
}

/// Device model names whose telemetry we understand. Devices reporting
/// any other type are dropped from discovery without error.
pub const SUPPORTED_DEVICE_TYPES: &[&str] = &["Now+"];

/// Returns `true` if `device_type` is a supported model name.
pub fn is_supported_device_type(device_type: &str) -> bool {
    SUPPORTED_DEVICE_TYPES.contains(&device_type)
}

const UG_M3: &str = "µg/m³";

/// Look up the descriptor for a raw property name within a group.
///
/// Returns `None` for unmapped names -- unknown vendor fields never cause
/// failure, they are simply not surfaced.
pub fn descriptor(group: TelemetryGroup, key: &str) -> Option<SensorDescriptor> {
    let d = |kind, label, unit, normalize| SensorDescriptor { kind, label, unit, normalize };

    match group {
        TelemetryGroup::Data => match key {
            "tvoc" => Some(d(
                MeasurementKind::VolatileOrganicCompounds,
                "VOC",
                Some(UG_M3),
                None,
            )),
            "eco2" => Some(d(MeasurementKind::CarbonDioxide, "Co2", Some("ppm"), None)),
            "pm10" => Some(d(MeasurementKind::Pm10, "PM10", Some(UG_M3), None)),
            "pm25" => Some(d(MeasurementKind::Pm25, "PM2.5", Some(UG_M3), None)),
            "pm1" => Some(d(MeasurementKind::Pm1, "PM1", Some(UG_M3), None)),
            "internal_temperature" => Some(d(
                MeasurementKind::Temperature,
                "Temperature",
                Some("°C"),
                Some(NormalizeFn::RawTemperature),
            )),
            "relative_humidity" => Some(d(MeasurementKind::Humidity, "Humidity", Some("%"), None)),
            "pressure" => Some(d(MeasurementKind::Pressure, "Pressure", Some("Pa"), None)),
            "airqualityindex" => Some(d(MeasurementKind::AirQualityIndex, "Air Quality", None, None)),
            _ => None,
        },
        TelemetryGroup::Aggregated => match key {
            "airqualityindex" => Some(d(MeasurementKind::AirQualityIndex, "Air Quality", None, None)),
            _ => None,
        },
    }
}
