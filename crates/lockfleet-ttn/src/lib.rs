pub mod config;
pub mod downlink;
pub mod subscriber;
pub mod topic;
pub mod wire;

pub use config::{TtnConfig, DEFAULT_TTN_HOST, DEFAULT_TTN_PORT};
pub use downlink::TtnDownlinkSender;
pub use subscriber::run_uplink_subscriber;
pub use topic::{downlink_topic, parse_uplink_topic, uplink_subscription, ParsedUplinkTopic};
pub use wire::{TtnDownlink, TtnMetadata, TtnUplink};
