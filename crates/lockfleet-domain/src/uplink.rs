use chrono::{DateTime, Utc};

/// One uplink message received from the network, transport-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Uplink {
    pub device_id: String,
    pub hardware_serial: String,
    pub port: u8,
    pub payload: Vec<u8>,
    /// Network receive time from uplink metadata, or receipt time when
    /// the transport supplies none
    pub received_at: DateTime<Utc>,
}
