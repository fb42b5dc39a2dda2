// ── Published poll state ──

use chrono::{DateTime, Utc};
use radoff_api::Device;

/// Identifies the polling mechanism that produced a snapshot.
pub const SOURCE_LABEL: &str = "cloud_poller";

/// One complete, immutable poll result.
///
/// Replaced atomically on every successful refresh; readers see either
/// the previous complete snapshot or the new one, never a partial state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source_label: &'static str,
    /// Devices in discovery response order.
    pub devices: Vec<Device>,
    /// Completion time of the producing refresh.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub(crate) fn new(devices: Vec<Device>) -> Self {
        Self {
            source_label: SOURCE_LABEL,
            devices,
            fetched_at: Utc::now(),
        }
    }

    /// Linear scan for an exact match on both type and id.
    ///
    /// Consumers re-resolve their device handle through this after every
    /// refresh -- devices are rebuilt per poll, never mutated in place.
    pub fn device_by_id(&self, device_type: &str, device_id: &str) -> Option<&Device> {
        self.devices
            .iter()
            .find(|d| d.device_type == device_type && d.device_id == device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn device(device_type: &str, id: &str) -> Device {
        Device {
            device_id: id.into(),
            device_serial: format!("SER-{id}"),
            device_type: device_type.into(),
            name: "test".into(),
            sensors: HashMap::new(),
        }
    }

    #[test]
    fn device_lookup_matches_on_both_fields() {
        let snap = Snapshot::new(vec![device("Now+", "a"), device("Now+", "b")]);

        assert!(snap.device_by_id("Now+", "b").is_some());
        assert!(snap.device_by_id("Now+", "c").is_none());
        assert!(snap.device_by_id("Other", "a").is_none());
    }

    #[test]
    fn snapshot_preserves_discovery_order() {
        let snap = Snapshot::new(vec![device("Now+", "z"), device("Now+", "a")]);
        let ids: Vec<&str> = snap.devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }
}
