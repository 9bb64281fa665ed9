use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lockfleet_payload::DecodedPayload;
use tokio::sync::RwLock;

use crate::lock::{LockRecord, LockState, ResolvedLocation};

/// In-memory registry of every lock the fleet has ever seen.
///
/// Records are created on first uplink and never deleted while the
/// process runs; restarts restore them from the snapshot store.
pub struct LockRegistry {
    locks: RwLock<HashMap<String, LockRecord>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, device_id: &str) -> Option<LockRecord> {
        let locks = self.locks.read().await;
        locks.get(device_id).cloned()
    }

    pub async fn contains(&self, device_id: &str) -> bool {
        let locks = self.locks.read().await;
        locks.contains_key(device_id)
    }

    /// All records sorted by id for deterministic output.
    pub async fn all(&self) -> Vec<LockRecord> {
        let locks = self.locks.read().await;
        let mut records: Vec<LockRecord> = locks.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub async fn count(&self) -> usize {
        let locks = self.locks.read().await;
        locks.len()
    }

    /// Replace the registry contents from a snapshot.
    pub async fn restore(&self, records: Vec<LockRecord>) {
        let mut locks = self.locks.write().await;
        locks.clear();
        for record in records {
            locks.insert(record.id.clone(), record);
        }
    }

    /// Apply a decoded uplink to the owning record, creating it on first
    /// sighting. Matching fields are replaced wholesale; a new WiFi scan
    /// clears any previously resolved coordinates; `last_seen` always
    /// advances, decodable payload or not.
    pub async fn apply(
        &self,
        device_id: &str,
        hardware_serial: &str,
        decoded: &DecodedPayload,
        seen_at: DateTime<Utc>,
    ) -> LockRecord {
        let mut locks = self.locks.write().await;
        let record = locks
            .entry(device_id.to_string())
            .or_insert_with(|| LockRecord::new(device_id, hardware_serial));
        record.last_seen = Some(seen_at);

        match decoded {
            DecodedPayload::LockState { locked } => {
                record.state = if *locked {
                    LockState::Locked
                } else {
                    LockState::Open
                };
            }
            DecodedPayload::GpsFix(fix) => {
                record.location.gps = Some(fix.clone());
            }
            DecodedPayload::WifiScan(access_points) => {
                record.location.wifi_scan = Some(access_points.clone());
                record.location.resolved = None;
            }
            DecodedPayload::Unrecognized => {}
        }

        record.clone()
    }

    /// Write back coordinates resolved from a WiFi scan. Returns false
    /// when the lock is unknown (resolution raced a restart).
    pub async fn set_resolved(&self, device_id: &str, resolved: ResolvedLocation) -> bool {
        let mut locks = self.locks.write().await;
        match locks.get_mut(device_id) {
            Some(record) => {
                record.location.resolved = Some(resolved);
                true
            }
            None => false,
        }
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockfleet_payload::{AccessPoint, GpsFix};

    fn gps_fix(latitude: f64) -> GpsFix {
        GpsFix {
            latitude,
            longitude: 4.9,
            altitude: 12,
            hdop: 1.1,
            satellites: 7,
            valid: true,
        }
    }

    fn access_point(bssid: &str) -> AccessPoint {
        AccessPoint {
            bssid: bssid.to_string(),
            rssi: -60,
        }
    }

    #[tokio::test]
    async fn test_apply_creates_record_on_first_sighting() {
        let registry = LockRegistry::new();
        let seen = Utc::now();

        let record = registry
            .apply("lock-1", "0004A30B001C1234", &DecodedPayload::Unrecognized, seen)
            .await;

        assert_eq!(record.id, "lock-1");
        assert_eq!(record.hardware_serial, "0004A30B001C1234");
        assert_eq!(record.state, LockState::Unknown);
        assert_eq!(record.last_seen, Some(seen));
        assert!(registry.contains("lock-1").await);
    }

    #[tokio::test]
    async fn test_apply_lock_state_replaces_state() {
        let registry = LockRegistry::new();
        let seen = Utc::now();

        registry
            .apply("lock-1", "serial", &DecodedPayload::LockState { locked: true }, seen)
            .await;
        let record = registry
            .apply(
                "lock-1",
                "serial",
                &DecodedPayload::LockState { locked: false },
                seen,
            )
            .await;

        assert_eq!(record.state, LockState::Open);
    }

    #[tokio::test]
    async fn test_apply_gps_replaces_fix_wholesale() {
        let registry = LockRegistry::new();
        let seen = Utc::now();

        registry
            .apply("lock-1", "serial", &DecodedPayload::GpsFix(gps_fix(52.0)), seen)
            .await;
        let record = registry
            .apply("lock-1", "serial", &DecodedPayload::GpsFix(gps_fix(53.5)), seen)
            .await;

        assert_eq!(record.location.gps.unwrap().latitude, 53.5);
    }

    #[tokio::test]
    async fn test_new_wifi_scan_clears_resolved_location() {
        let registry = LockRegistry::new();
        let seen = Utc::now();

        registry
            .apply(
                "lock-1",
                "serial",
                &DecodedPayload::WifiScan(vec![access_point("aa:bb:cc:dd:ee:ff")]),
                seen,
            )
            .await;
        let updated = registry
            .set_resolved(
                "lock-1",
                ResolvedLocation {
                    latitude: 52.1,
                    longitude: 4.8,
                    accuracy: Some(20.0),
                    resolved_at: seen,
                },
            )
            .await;
        assert!(updated);

        let record = registry
            .apply(
                "lock-1",
                "serial",
                &DecodedPayload::WifiScan(vec![access_point("11:22:33:44:55:66")]),
                seen,
            )
            .await;

        assert!(record.location.resolved.is_none());
        assert_eq!(
            record.location.wifi_scan.unwrap()[0].bssid,
            "11:22:33:44:55:66"
        );
    }

    #[tokio::test]
    async fn test_unrecognized_payload_still_advances_last_seen() {
        let registry = LockRegistry::new();
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(90);

        registry
            .apply("lock-1", "serial", &DecodedPayload::LockState { locked: true }, first)
            .await;
        let record = registry
            .apply("lock-1", "serial", &DecodedPayload::Unrecognized, later)
            .await;

        assert_eq!(record.last_seen, Some(later));
        assert_eq!(record.state, LockState::Locked);
    }

    #[tokio::test]
    async fn test_set_resolved_unknown_lock_returns_false() {
        let registry = LockRegistry::new();
        let updated = registry
            .set_resolved(
                "lock-404",
                ResolvedLocation {
                    latitude: 0.0,
                    longitude: 0.0,
                    accuracy: None,
                    resolved_at: Utc::now(),
                },
            )
            .await;
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_all_is_sorted_by_id() {
        let registry = LockRegistry::new();
        let seen = Utc::now();
        for id in ["lock-3", "lock-1", "lock-2"] {
            registry
                .apply(id, "serial", &DecodedPayload::Unrecognized, seen)
                .await;
        }

        let ids: Vec<String> = registry.all().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["lock-1", "lock-2", "lock-3"]);
    }

    #[tokio::test]
    async fn test_restore_replaces_contents() {
        let registry = LockRegistry::new();
        registry
            .apply("lock-old", "serial", &DecodedPayload::Unrecognized, Utc::now())
            .await;

        registry
            .restore(vec![LockRecord::new("lock-new", "serial-2")])
            .await;

        assert!(!registry.contains("lock-old").await);
        assert!(registry.contains("lock-new").await);
        assert_eq!(registry.count().await, 1);
    }
}
