use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainResult;

/// Where the network server slots a downlink relative to ones already
/// scheduled for the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownlinkSchedule {
    First,
    Last,
    Replace,
}

/// Trait for handing a downlink to the network transport.
/// The MQTT adapter implements this against the TTN data API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownlinkSender: Send + Sync {
    /// Queue one downlink with the network server. Delivery happens in
    /// the device's next receive window; there is no delivery receipt.
    async fn send(
        &self,
        device_id: &str,
        port: u8,
        confirmed: bool,
        payload: &[u8],
        schedule: DownlinkSchedule,
    ) -> DomainResult<()>;
}
