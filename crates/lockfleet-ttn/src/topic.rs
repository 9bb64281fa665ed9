use lockfleet_domain::{DomainError, DomainResult};

/// Parsed TTN v2 uplink topic identifying application and device.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUplinkTopic {
    pub app_id: String,
    pub device_id: String,
}

/// Parse a TTN v2 uplink topic in the format
/// `{app_id}/devices/{device_id}/up`.
pub fn parse_uplink_topic(topic: &str) -> DomainResult<ParsedUplinkTopic> {
    let parts: Vec<&str> = topic.split('/').collect();

    if parts.len() != 4 || parts[1] != "devices" || parts[3] != "up" {
        return Err(DomainError::Transport(anyhow::anyhow!(
            "Invalid uplink topic '{}': expected '{{app_id}}/devices/{{device_id}}/up'",
            topic
        )));
    }

    let app_id = parts[0].trim();
    let device_id = parts[2].trim();

    if app_id.is_empty() {
        return Err(DomainError::Transport(anyhow::anyhow!(
            "Application ID cannot be empty in topic"
        )));
    }

    if device_id.is_empty() {
        return Err(DomainError::Transport(anyhow::anyhow!(
            "Device ID cannot be empty in topic"
        )));
    }

    Ok(ParsedUplinkTopic {
        app_id: app_id.to_string(),
        device_id: device_id.to_string(),
    })
}

/// Topic the network server reads device downlinks from.
pub fn downlink_topic(app_id: &str, device_id: &str) -> String {
    format!("{}/devices/{}/down", app_id, device_id)
}

/// Wildcard subscription covering every device of an application.
pub fn uplink_subscription(app_id: &str) -> String {
    format!("{}/devices/+/up", app_id)
}
