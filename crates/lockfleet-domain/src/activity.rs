use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Entries kept in memory; older entries are dropped
pub const ACTIVITY_LOG_CAPACITY: usize = 1000;

/// Entries exposed on the read surface
pub const RECENT_ACTIVITY_LIMIT: usize = 50;

/// What happened to a message, from the fleet's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Uplink received from a device
    Received,
    /// Downlink handed to the transport
    Sent,
    /// Downlink accepted into the command queue
    Queued,
    /// Queued downlink expired before a send window opened
    Timeout,
}

/// One append-only activity feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub device_id: String,
    pub kind: ActivityKind,
    pub payload: Vec<u8>,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, device_id: &str, payload: Vec<u8>, at: DateTime<Utc>) -> Self {
        Self {
            at,
            device_id: device_id.to_string(),
            kind,
            payload,
        }
    }
}

/// Bounded in-memory activity feed shared across the fleet.
pub struct ActivityLog {
    entries: RwLock<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, dropping the oldest once the capacity is reached.
    pub async fn record(&self, entry: ActivityEntry) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The most recent `limit` entries in chronological order.
    pub async fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
