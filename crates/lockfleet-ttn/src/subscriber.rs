use crate::config::TtnConfig;
use crate::topic::{parse_uplink_topic, uplink_subscription};
use crate::wire::TtnUplink;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use lockfleet_domain::{DomainError, DomainResult, Uplink};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument, Span};

/// Run the TTN uplink subscriber.
///
/// Subscribes to `{app_id}/devices/+/up` and forwards every decodable
/// uplink message into the channel. Reconnects with a fixed delay until
/// the retry budget is spent or the token is cancelled.
#[instrument(name = "ttn_subscriber", skip_all, fields(app_id = %config.app_id))]
pub async fn run_uplink_subscriber(
    config: TtnConfig,
    uplinks: mpsc::Sender<Uplink>,
    shutdown: CancellationToken,
) {
    info!(
        host = %config.host,
        port = config.port,
        "starting TTN uplink subscriber"
    );

    let mut retry_count = 0;

    loop {
        if shutdown.is_cancelled() {
            debug!("uplink subscriber cancelled before connection");
            break;
        }

        match run_connection(&config, &uplinks, &shutdown).await {
            Ok(()) => {
                // Clean exit (cancellation)
                debug!("uplink subscriber stopped cleanly");
                break;
            }
            Err(e) => {
                error!(error = %e, "TTN connection error");

                retry_count += 1;
                if retry_count >= config.max_retry_attempts {
                    error!(
                        max_retries = config.max_retry_attempts,
                        "max retry attempts reached, stopping uplink subscriber"
                    );
                    break;
                }

                warn!(
                    attempt = retry_count,
                    max_attempts = config.max_retry_attempts,
                    "retrying TTN connection"
                );

                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(config.retry_delay()) => {}
                }
            }
        }
    }

    info!("TTN uplink subscriber stopped");
}

/// Run a single MQTT connection session against the TTN broker.
async fn run_connection(
    config: &TtnConfig,
    uplinks: &mpsc::Sender<Uplink>,
    shutdown: &CancellationToken,
) -> DomainResult<()> {
    let client_id = format!("lockfleet-{}", config.app_id);
    let mut mqtt_options = MqttOptions::new(&client_id, &config.host, config.port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);
    mqtt_options.set_credentials(&config.app_id, &config.access_key);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    let subscribe_topic = uplink_subscription(&config.app_id);
    client
        .subscribe(&subscribe_topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| DomainError::Transport(anyhow::anyhow!("Failed to subscribe: {}", e)))?;

    info!(topic = %subscribe_topic, "subscribed to TTN uplink topic");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("shutdown signal received");
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_publish(&config.app_id, &publish.topic, &publish.payload, uplinks)
                            .await;
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        debug!("subscription acknowledged");
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to TTN broker");
                    }
                    Ok(Event::Incoming(Packet::PingResp)) => {
                        // Ping response - connection is healthy
                    }
                    Ok(_) => {
                        // Other events (outgoing, etc.)
                    }
                    Err(e) => {
                        return Err(DomainError::Transport(anyhow::anyhow!(
                            "MQTT event loop error: {}",
                            e
                        )));
                    }
                }
            }
        }
    }
}

/// Handle one incoming uplink publish.
///
/// Creates a new independent trace per message. Malformed messages are
/// logged and skipped; the subscriber never stops over bad input.
pub(crate) async fn handle_publish(
    app_id: &str,
    topic: &str,
    payload: &[u8],
    uplinks: &mpsc::Sender<Uplink>,
) {
    let span = info_span!(
        parent: Span::none(),
        "ttn_uplink",
        topic = %topic,
        payload_size = payload.len(),
        device_id = tracing::field::Empty,
    );

    async {
        let parsed = match parse_uplink_topic(topic) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to parse uplink topic, skipping message");
                return;
            }
        };

        Span::current().record("device_id", parsed.device_id.as_str());

        if parsed.app_id != app_id {
            warn!(
                topic_app = %parsed.app_id,
                configured_app = %app_id,
                "application ID mismatch, skipping message"
            );
            return;
        }

        let message: TtnUplink = match serde_json::from_slice(payload) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to parse uplink body, skipping message");
                return;
            }
        };

        let decoded_payload = match &message.payload_raw {
            Some(encoded) => match STANDARD.decode(encoded) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "failed to decode payload_raw, skipping message");
                    return;
                }
            },
            None => Vec::new(),
        };

        let received_at = message
            .metadata
            .and_then(|m| m.time)
            .unwrap_or_else(Utc::now);

        let uplink = Uplink {
            device_id: parsed.device_id,
            hardware_serial: message.hardware_serial,
            port: message.port,
            payload: decoded_payload,
            received_at,
        };

        if uplinks.send(uplink).await.is_err() {
            error!("uplink channel closed, dropping message");
        } else {
            debug!("uplink forwarded to pipeline");
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    // Connection and retry handling need a live broker; only the message
    // path is tested here.

    fn channel() -> (mpsc::Sender<Uplink>, mpsc::Receiver<Uplink>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn test_handle_publish_forwards_uplink() {
        let (tx, mut rx) = channel();
        let body = r#"{
            "app_id": "lockapp",
            "dev_id": "lock-1",
            "hardware_serial": "0004A30B001C1234",
            "port": 1,
            "payload_raw": "AQE=",
            "metadata": { "time": "2026-08-21T10:15:00Z" }
        }"#;

        handle_publish("lockapp", "lockapp/devices/lock-1/up", body.as_bytes(), &tx).await;

        let uplink = rx.try_recv().unwrap();
        assert_eq!(uplink.device_id, "lock-1");
        assert_eq!(uplink.hardware_serial, "0004A30B001C1234");
        assert_eq!(uplink.port, 1);
        assert_eq!(uplink.payload, vec![0x01, 0x01]);
        assert_eq!(
            uplink.received_at,
            "2026-08-21T10:15:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_handle_publish_without_payload_forwards_empty_bytes() {
        let (tx, mut rx) = channel();
        let body = r#"{"hardware_serial": "AA", "port": 1}"#;

        handle_publish("lockapp", "lockapp/devices/lock-2/up", body.as_bytes(), &tx).await;

        let uplink = rx.try_recv().unwrap();
        assert_eq!(uplink.device_id, "lock-2");
        assert!(uplink.payload.is_empty());
    }

    #[tokio::test]
    async fn test_handle_publish_skips_invalid_json() {
        let (tx, mut rx) = channel();

        handle_publish("lockapp", "lockapp/devices/lock-1/up", b"not json", &tx).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_publish_skips_bad_base64() {
        let (tx, mut rx) = channel();
        let body = r#"{"port": 1, "payload_raw": "!!!not-base64!!!"}"#;

        handle_publish("lockapp", "lockapp/devices/lock-1/up", body.as_bytes(), &tx).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_publish_skips_foreign_application() {
        let (tx, mut rx) = channel();
        let body = r#"{"port": 1}"#;

        handle_publish("lockapp", "otherapp/devices/lock-1/up", body.as_bytes(), &tx).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_publish_skips_malformed_topic() {
        let (tx, mut rx) = channel();
        let body = r#"{"port": 1}"#;

        handle_publish("lockapp", "lockapp/lock-1/up", body.as_bytes(), &tx).await;

        assert!(rx.try_recv().is_err());
    }
}
