use chrono::{DateTime, Utc};
use lockfleet_domain::DownlinkSchedule;
use serde::{Deserialize, Serialize};

/// TTN v2 uplink message body as published on `{app_id}/devices/{id}/up`.
/// Only the fields the fleet consumes are modeled; the rest are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TtnUplink {
    #[serde(default)]
    pub hardware_serial: String,
    #[serde(default)]
    pub port: u8,
    /// Base64-encoded application payload; absent on payload-less frames
    #[serde(default)]
    pub payload_raw: Option<String>,
    #[serde(default)]
    pub metadata: Option<TtnMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TtnMetadata {
    /// Network receive time, RFC 3339
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// TTN v2 downlink message body for `{app_id}/devices/{id}/down`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtnDownlink {
    pub port: u8,
    pub confirmed: bool,
    pub payload_raw: String,
    pub schedule: DownlinkSchedule,
}
