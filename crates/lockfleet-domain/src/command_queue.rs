use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::command::PendingCommand;

/// Per-device FIFO queues of pending downlinks.
///
/// Every mutation runs under one write-lock acquisition and removals are
/// wholesale, so a command leaves the queue exactly once: either in a
/// backlog take (delivery attempt) or in an expiry take, never both.
pub struct CommandQueue {
    queues: RwLock<HashMap<String, VecDeque<PendingCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
        }
    }

    /// Append a command to its device queue.
    pub async fn push(&self, command: PendingCommand) {
        let mut queues = self.queues.write().await;
        queues
            .entry(command.device_id.clone())
            .or_default()
            .push_back(command);
    }

    /// Remove and return the whole backlog for a device, oldest first.
    pub async fn take_backlog(&self, device_id: &str) -> Vec<PendingCommand> {
        let mut queues = self.queues.write().await;
        queues
            .remove(device_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Remove and return every expired command across all devices,
    /// preserving FIFO order of the survivors.
    pub async fn take_expired(&self, now: DateTime<Utc>) -> Vec<PendingCommand> {
        let mut queues = self.queues.write().await;
        let mut expired = Vec::new();
        for backlog in queues.values_mut() {
            let drained = std::mem::take(backlog);
            for command in drained {
                if command.is_expired(now) {
                    expired.push(command);
                } else {
                    backlog.push_back(command);
                }
            }
        }
        queues.retain(|_, backlog| !backlog.is_empty());
        expired
    }

    pub async fn pending(&self, device_id: &str) -> usize {
        let queues = self.queues.read().await;
        queues.get(device_id).map(VecDeque::len).unwrap_or(0)
    }

    pub async fn total_pending(&self) -> usize {
        let queues = self.queues.read().await;
        queues.values().map(VecDeque::len).sum()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
