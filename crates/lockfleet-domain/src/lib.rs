pub mod activity;
pub mod command;
pub mod command_queue;
pub mod downlink_sender;
pub mod error;
pub mod fleet_service;
pub mod location_resolver;
pub mod lock;
pub mod lock_registry;
pub mod snapshot_store;
pub mod uplink;

pub use activity::{
    ActivityEntry, ActivityKind, ActivityLog, ACTIVITY_LOG_CAPACITY, RECENT_ACTIVITY_LIMIT,
};
pub use command::{PendingCommand, COMMAND_TTL_SECS, UNLOCK_PAYLOAD, UNLOCK_PORT};
pub use command_queue::CommandQueue;
pub use downlink_sender::{DownlinkSchedule, DownlinkSender};
pub use error::{DomainError, DomainResult};
pub use fleet_service::{FleetService, ResolveRequest};
pub use location_resolver::LocationResolver;
pub use lock::{LockLocation, LockRecord, LockState, ResolvedLocation};
pub use lock_registry::LockRegistry;
pub use snapshot_store::SnapshotStore;
pub use uplink::Uplink;
