use async_trait::async_trait;

use crate::error::DomainResult;
use crate::lock::LockRecord;

/// Trait for persisting fleet state across restarts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved fleet. Missing or unreadable snapshots load
    /// as an empty fleet rather than failing startup.
    async fn load(&self) -> DomainResult<Vec<LockRecord>>;

    /// Persist the full fleet.
    async fn save(&self, records: &[LockRecord]) -> DomainResult<()>;
}
