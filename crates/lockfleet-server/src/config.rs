use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    // TTN configuration
    /// TTN application id (doubles as the MQTT username)
    pub ttn_app_id: String,

    /// TTN application access key (doubles as the MQTT password)
    pub ttn_access_key: String,

    /// TTN MQTT broker host
    #[serde(default = "default_ttn_host")]
    pub ttn_host: String,

    /// TTN MQTT broker port
    #[serde(default = "default_ttn_port")]
    pub ttn_port: u16,

    /// Bind address for the HTTP API
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Path of the fleet snapshot file
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // WiFi geolocation configuration
    /// API key for the geolocation service; resolution is disabled when unset
    #[serde(default)]
    pub geoloc_api_key: Option<String>,

    /// Override for the geolocation endpoint URL
    #[serde(default)]
    pub geoloc_url: Option<String>,
}

fn default_ttn_host() -> String {
    lockfleet_ttn::DEFAULT_TTN_HOST.to_string()
}

fn default_ttn_port() -> u16 {
    lockfleet_ttn::DEFAULT_TTN_PORT
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_state_path() -> String {
    "locks.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LOCKFLEET"))
            .build()?
            .try_deserialize()
    }

    /// TTN connection settings derived from this config.
    pub fn ttn(&self) -> lockfleet_ttn::TtnConfig {
        let mut ttn = lockfleet_ttn::TtnConfig::new(&self.ttn_app_id, &self.ttn_access_key);
        ttn.host = self.ttn_host.clone();
        ttn.port = self.ttn_port;
        ttn
    }
}
