use async_trait::async_trait;
use lockfleet_payload::AccessPoint;

use crate::error::DomainResult;
use crate::lock::ResolvedLocation;

/// Trait for resolving a WiFi scan to coordinates.
/// Infrastructure (e.g. the HTTP positioning client) implements this.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolve observed access points to a position. Called with at
    /// least one access point.
    async fn resolve(&self, access_points: &[AccessPoint]) -> DomainResult<ResolvedLocation>;
}
