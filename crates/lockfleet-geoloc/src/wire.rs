use serde::{Deserialize, Serialize};

/// Request body for the WiFi positioning endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationRequest {
    pub consider_ip: bool,
    pub wifi_access_points: Vec<WifiAccessPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiAccessPoint {
    pub mac_address: String,
    pub signal_strength: i16,
}

/// Response body: resolved coordinates plus an accuracy radius in meters.
#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationResponse {
    pub location: Coordinates,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}
