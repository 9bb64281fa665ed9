use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lockfleet_domain::{DomainError, DomainResult, LocationResolver, ResolvedLocation};
use lockfleet_payload::AccessPoint;
use tracing::debug;

use crate::wire::{GeolocationRequest, GeolocationResponse, WifiAccessPoint};

const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/geolocation/v1/geolocate";

/// HTTP client resolving WiFi scans through a positioning API.
///
/// Speaks the Google geolocation wire format: observed access points go
/// out, coordinates and an accuracy radius come back.
#[derive(Debug, Clone)]
pub struct WifiLocationClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WifiLocationClient {
    pub fn new(api_key: &str) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                DomainError::Geolocation(anyhow::anyhow!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Overrides the endpoint, e.g. for a different positioning
    /// provider speaking the same wire format.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl LocationResolver for WifiLocationClient {
    async fn resolve(&self, access_points: &[AccessPoint]) -> DomainResult<ResolvedLocation> {
        let request = GeolocationRequest {
            consider_ip: false,
            wifi_access_points: access_points
                .iter()
                .map(|ap| WifiAccessPoint {
                    mac_address: ap.bssid.clone(),
                    signal_strength: ap.rssi,
                })
                .collect(),
        };

        debug!(access_points = access_points.len(), "resolving WiFi scan");

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Geolocation(anyhow::anyhow!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Geolocation(anyhow::anyhow!(
                "positioning API returned {}: {}",
                status,
                body
            )));
        }

        let resolved: GeolocationResponse = response.json().await.map_err(|e| {
            DomainError::Geolocation(anyhow::anyhow!("failed to parse response: {}", e))
        })?;

        debug!(
            lat = resolved.location.lat,
            lng = resolved.location.lng,
            "WiFi scan resolved"
        );

        Ok(ResolvedLocation {
            latitude: resolved.location.lat,
            longitude: resolved.location.lng,
            accuracy: resolved.accuracy,
            resolved_at: Utc::now(),
        })
    }
}
