use crate::activity::{ActivityEntry, ActivityKind, ActivityLog, RECENT_ACTIVITY_LIMIT};
use crate::command::{PendingCommand, UNLOCK_PAYLOAD, UNLOCK_PORT};
use crate::command_queue::CommandQueue;
use crate::downlink_sender::{DownlinkSchedule, DownlinkSender};
use crate::error::{DomainError, DomainResult};
use crate::lock::{LockRecord, ResolvedLocation};
use crate::lock_registry::LockRegistry;
use crate::uplink::Uplink;
use chrono::{DateTime, Utc};
use lockfleet_payload::{decode, AccessPoint, DecodedPayload};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A WiFi scan waiting to be resolved to coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub device_id: String,
    pub access_points: Vec<AccessPoint>,
}

/// Domain service that ties registry, command queue, and activity log
/// together around the uplink/downlink cycle.
///
/// Flow per uplink:
/// 1. Log the received payload
/// 2. Decode and apply telemetry to the lock record
/// 3. Drain the device's downlink backlog into the open receive window
/// 4. Hand a fresh WiFi scan back to the caller for resolution
pub struct FleetService {
    registry: LockRegistry,
    queue: CommandQueue,
    activity: ActivityLog,
    sender: Arc<dyn DownlinkSender>,
}

impl FleetService {
    /// Create a new FleetService with empty state.
    pub fn new(sender: Arc<dyn DownlinkSender>) -> Self {
        Self {
            registry: LockRegistry::new(),
            queue: CommandQueue::new(),
            activity: ActivityLog::new(),
            sender,
        }
    }

    /// Replace fleet state from a snapshot, normally once at startup.
    pub async fn restore(&self, records: Vec<LockRecord>) {
        let count = records.len();
        self.registry.restore(records).await;
        info!(locks = count, "Fleet state restored from snapshot");
    }

    /// Process one uplink end to end. Returns a resolve request when the
    /// uplink carried a non-empty WiFi scan.
    pub async fn ingest_uplink(&self, uplink: Uplink) -> Option<ResolveRequest> {
        self.ingest_uplink_at(uplink, Utc::now()).await
    }

    async fn ingest_uplink_at(
        &self,
        uplink: Uplink,
        now: DateTime<Utc>,
    ) -> Option<ResolveRequest> {
        debug!(
            device_id = %uplink.device_id,
            port = uplink.port,
            payload_size = uplink.payload.len(),
            "Processing uplink"
        );

        // 1. Log the received payload
        self.activity
            .record(ActivityEntry::new(
                ActivityKind::Received,
                &uplink.device_id,
                uplink.payload.clone(),
                now,
            ))
            .await;

        // 2. Decode and apply telemetry
        let decoded = decode(uplink.port, &uplink.payload);
        let record = self
            .registry
            .apply(
                &uplink.device_id,
                &uplink.hardware_serial,
                &decoded,
                uplink.received_at,
            )
            .await;

        match &decoded {
            DecodedPayload::LockState { .. } => {
                info!(device_id = %uplink.device_id, state = ?record.state, "Lock state updated");
            }
            DecodedPayload::GpsFix(fix) => {
                debug!(device_id = %uplink.device_id, valid = fix.valid, "GPS fix stored");
            }
            DecodedPayload::WifiScan(access_points) => {
                debug!(
                    device_id = %uplink.device_id,
                    access_points = access_points.len(),
                    "WiFi scan stored"
                );
            }
            DecodedPayload::Unrecognized => {
                debug!(
                    device_id = %uplink.device_id,
                    port = uplink.port,
                    "Unrecognized payload"
                );
            }
        }

        // 3. The uplink opened a receive window: flush the backlog
        self.drain_backlog(&uplink.device_id, now).await;

        // 4. A fresh non-empty WiFi scan can be resolved to coordinates
        match decoded {
            DecodedPayload::WifiScan(access_points) if !access_points.is_empty() => {
                Some(ResolveRequest {
                    device_id: uplink.device_id,
                    access_points,
                })
            }
            _ => None,
        }
    }

    /// Deliver or expire every queued command for the device. A failed
    /// send is logged and consumed like a successful one; it never stops
    /// the rest of the backlog.
    async fn drain_backlog(&self, device_id: &str, now: DateTime<Utc>) {
        let backlog = self.queue.take_backlog(device_id).await;
        if backlog.is_empty() {
            return;
        }
        debug!(device_id = %device_id, commands = backlog.len(), "Draining downlink backlog");

        for command in backlog {
            if command.is_expired(now) {
                info!(device_id = %device_id, "Dropping expired downlink");
                self.activity
                    .record(ActivityEntry::new(
                        ActivityKind::Timeout,
                        device_id,
                        command.payload,
                        now,
                    ))
                    .await;
                continue;
            }

            if let Err(err) = self
                .sender
                .send(
                    device_id,
                    command.port,
                    command.confirmed,
                    &command.payload,
                    DownlinkSchedule::Last,
                )
                .await
            {
                warn!(device_id = %device_id, error = %err, "Downlink send failed");
            }
            self.activity
                .record(ActivityEntry::new(
                    ActivityKind::Sent,
                    device_id,
                    command.payload,
                    now,
                ))
                .await;
        }
    }

    /// Queue the fixed unlock command for delivery in the device's next
    /// receive window.
    pub async fn enqueue_unlock(&self, device_id: &str) -> DomainResult<()> {
        self.enqueue(device_id, UNLOCK_PAYLOAD.to_vec(), UNLOCK_PORT, false)
            .await
    }

    /// Queue an arbitrary downlink for a known lock.
    pub async fn enqueue(
        &self,
        device_id: &str,
        payload: Vec<u8>,
        port: u8,
        confirmed: bool,
    ) -> DomainResult<()> {
        self.enqueue_at(device_id, payload, port, confirmed, Utc::now())
            .await
    }

    async fn enqueue_at(
        &self,
        device_id: &str,
        payload: Vec<u8>,
        port: u8,
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.registry.contains(device_id).await {
            return Err(DomainError::LockNotFound(device_id.to_string()));
        }

        let command = PendingCommand::new(device_id, payload, port, confirmed, now);
        let entry = ActivityEntry::new(ActivityKind::Queued, device_id, command.payload.clone(), now);
        self.queue.push(command).await;
        self.activity.record(entry).await;
        info!(device_id = %device_id, port = port, "Downlink queued");
        Ok(())
    }

    /// Drop and log every queued command whose TTL has passed. Returns
    /// the number of commands timed out.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let expired = self.queue.take_expired(now).await;
        if expired.is_empty() {
            return 0;
        }

        let count = expired.len();
        for command in expired {
            info!(device_id = %command.device_id, "Downlink expired without a send window");
            self.activity
                .record(ActivityEntry::new(
                    ActivityKind::Timeout,
                    &command.device_id,
                    command.payload,
                    now,
                ))
                .await;
        }
        count
    }

    /// Write back coordinates resolved from an earlier WiFi scan.
    /// Last write wins; a resolution that raced a restart is dropped.
    pub async fn apply_resolved_location(&self, device_id: &str, resolved: ResolvedLocation) {
        if self.registry.set_resolved(device_id, resolved).await {
            debug!(device_id = %device_id, "Resolved location stored");
        } else {
            debug!(device_id = %device_id, "Resolved location for unknown lock dropped");
        }
    }

    pub async fn locks(&self) -> Vec<LockRecord> {
        self.registry.all().await
    }

    pub async fn lock(&self, device_id: &str) -> Option<LockRecord> {
        self.registry.get(device_id).await
    }

    pub async fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.activity.recent(RECENT_ACTIVITY_LIMIT).await
    }

    pub async fn pending_commands(&self, device_id: &str) -> usize {
        self.queue.pending(device_id).await
    }
}
