use std::time::Duration;

pub const DEFAULT_TTN_HOST: &str = "eu.thethings.network";
pub const DEFAULT_TTN_PORT: u16 = 1883;

/// Connection settings for the TTN v2 MQTT data API.
///
/// The application id doubles as the MQTT username and the access key as
/// the password.
#[derive(Debug, Clone)]
pub struct TtnConfig {
    pub app_id: String,
    pub access_key: String,
    pub host: String,
    pub port: u16,
    pub max_retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl TtnConfig {
    pub fn new(app_id: &str, access_key: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            access_key: access_key.to_string(),
            host: DEFAULT_TTN_HOST.to_string(),
            port: DEFAULT_TTN_PORT,
            max_retry_attempts: 10,
            retry_delay_secs: 5,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
