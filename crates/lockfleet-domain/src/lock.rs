use chrono::{DateTime, Utc};
use lockfleet_payload::{AccessPoint, GpsFix};
use serde::{Deserialize, Serialize};

/// Operational state reported by the lock on port 1.
///
/// `Unknown` until the first valid state uplink arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Unknown,
    Locked,
    Open,
}

/// Coordinates resolved from a WiFi scan by the positioning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub resolved_at: DateTime<Utc>,
}

/// Location evidence for a lock. Each field is replaced wholesale by the
/// uplink that carries it; `resolved` is cleared whenever a new WiFi scan
/// lands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockLocation {
    pub gps: Option<GpsFix>,
    pub wifi_scan: Option<Vec<AccessPoint>>,
    pub resolved: Option<ResolvedLocation>,
}

/// Domain entity for one lock in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Stable device identifier assigned by the network (primary key)
    pub id: String,
    /// Opaque hardware serial captured from the first uplink
    pub hardware_serial: String,
    pub state: LockState,
    /// Timestamp of the most recent uplink, advances on every uplink
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: LockLocation,
}

impl LockRecord {
    pub fn new(id: &str, hardware_serial: &str) -> Self {
        Self {
            id: id.to_string(),
            hardware_serial: hardware_serial.to_string(),
            state: LockState::Unknown,
            last_seen: None,
            location: LockLocation::default(),
        }
    }
}
