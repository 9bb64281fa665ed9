mod config;
mod pipeline;
mod runner;
mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use config::ServiceConfig;
use lockfleet_domain::{FleetService, LocationResolver, SnapshotStore};
use lockfleet_geoloc::WifiLocationClient;
use lockfleet_http::{start_server, ApiState};
use lockfleet_ttn::{run_uplink_subscriber, TtnDownlinkSender};
use pipeline::UplinkPipeline;
use runner::ServiceSet;
use snapshot::JsonSnapshotStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("starting lockfleet server");

    if let Err(e) = run(config).await {
        error!("lockfleet server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    // Restore the fleet from the last snapshot
    let snapshots = Arc::new(JsonSnapshotStore::new(&config.state_path));
    let restored = snapshots.load().await?;
    info!(locks = restored.len(), path = %config.state_path, "fleet snapshot loaded");

    let ttn_config = config.ttn();
    let sender = Arc::new(TtnDownlinkSender::new(&ttn_config, shutdown.clone()));
    let fleet = Arc::new(FleetService::new(sender));
    fleet.restore(restored).await;

    let resolver: Option<Arc<dyn LocationResolver>> = match config.geoloc_api_key.as_deref() {
        Some(api_key) => {
            let mut client = WifiLocationClient::new(api_key)?;
            if let Some(url) = config.geoloc_url.clone() {
                client = client.with_base_url(url);
            }
            info!("wifi location resolution enabled");
            Some(Arc::new(client))
        }
        None => {
            warn!("no geolocation API key configured, wifi scans will not be resolved");
            None
        }
    };

    let (uplink_tx, uplink_rx) = mpsc::channel(100);
    let uplink_pipeline = UplinkPipeline::new(Arc::clone(&fleet), resolver);
    let api_state = ApiState::new(Arc::clone(&fleet), snapshots.clone());
    let http_addr = config.http_addr.clone();

    let set = ServiceSet::new(shutdown)
        .with_process({
            let ttn_config = ttn_config.clone();
            move |ctx| async move {
                run_uplink_subscriber(ttn_config, uplink_tx, ctx).await;
                Ok(())
            }
        })
        .with_process(move |ctx| uplink_pipeline.run(uplink_rx, ctx))
        .with_process(move |ctx| async move { start_server(&http_addr, api_state, ctx).await })
        .with_closer({
            let fleet = Arc::clone(&fleet);
            let snapshots = Arc::clone(&snapshots);
            move || async move {
                let records = fleet.locks().await;
                snapshots.save(&records).await?;
                info!(locks = records.len(), "fleet snapshot saved on shutdown");
                Ok(())
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    set.run().await
}
