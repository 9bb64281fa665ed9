use crate::config::TtnConfig;
use crate::topic::downlink_topic;
use crate::wire::TtnDownlink;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lockfleet_domain::{DomainError, DomainResult, DownlinkSchedule, DownlinkSender};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// DownlinkSender backed by a dedicated TTN MQTT publisher connection.
///
/// Publishing queues the downlink with the network server; delivery to
/// the device happens in its next receive window with no receipt.
pub struct TtnDownlinkSender {
    client: AsyncClient,
    app_id: String,
}

impl TtnDownlinkSender {
    /// Create the sender and spawn the task that drives its connection.
    /// The driver reconnects after errors and exits on cancellation.
    pub fn new(config: &TtnConfig, shutdown: CancellationToken) -> Self {
        let client_id = format!("lockfleet-{}-downlink", config.app_id);
        let mut mqtt_options = MqttOptions::new(&client_id, &config.host, config.port);
        mqtt_options.set_keep_alive(Duration::from_secs(30));
        mqtt_options.set_clean_session(true);
        mqtt_options.set_credentials(&config.app_id, &config.access_key);

        let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);
        let retry_delay = config.retry_delay();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("downlink connection driver stopped");
                        break;
                    }
                    event = eventloop.poll() => {
                        match event {
                            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                                debug!("downlink connection established");
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "downlink connection error, reconnecting");
                                tokio::select! {
                                    _ = shutdown.cancelled() => break,
                                    _ = tokio::time::sleep(retry_delay) => {}
                                }
                            }
                        }
                    }
                }
            }
        });

        Self {
            client,
            app_id: config.app_id.clone(),
        }
    }
}

#[async_trait]
impl DownlinkSender for TtnDownlinkSender {
    async fn send(
        &self,
        device_id: &str,
        port: u8,
        confirmed: bool,
        payload: &[u8],
        schedule: DownlinkSchedule,
    ) -> DomainResult<()> {
        let topic = downlink_topic(&self.app_id, device_id);
        let message = TtnDownlink {
            port,
            confirmed,
            payload_raw: STANDARD.encode(payload),
            schedule,
        };
        let body = serde_json::to_vec(&message).map_err(|e| {
            DomainError::Transport(anyhow::anyhow!("Failed to serialize downlink: {}", e))
        })?;

        self.client
            .publish(&topic, QoS::AtLeastOnce, false, body)
            .await
            .map_err(|e| {
                DomainError::Transport(anyhow::anyhow!("Failed to publish downlink: {}", e))
            })?;

        debug!(device_id = %device_id, topic = %topic, port = port, "downlink published");
        Ok(())
    }
}
