use chrono::{DateTime, Duration, Utc};

/// Queued downlinks older than this are dropped as timed out
pub const COMMAND_TTL_SECS: i64 = 60;

/// The fixed unlock command understood by the lock firmware
pub const UNLOCK_PAYLOAD: [u8; 3] = [0x01, 0x01, 0x01];
pub const UNLOCK_PORT: u8 = 1;

/// A downlink waiting for the device's next receive window.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    pub device_id: String,
    pub payload: Vec<u8>,
    pub port: u8,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingCommand {
    pub fn new(
        device_id: &str,
        payload: Vec<u8>,
        port: u8,
        confirmed: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            payload,
            port,
            confirmed,
            created_at,
            expires_at: created_at + Duration::seconds(COMMAND_TTL_SECS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
