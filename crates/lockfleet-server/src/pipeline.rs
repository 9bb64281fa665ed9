use std::sync::Arc;
use std::time::Duration;

use lockfleet_domain::{FleetService, LocationResolver, ResolvedLocation, Uplink};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Interval between expiry sweeps over the command queues.
pub const SWEEP_INTERVAL_SECS: u64 = 5;

/// Drives uplinks from the TTN subscriber into the fleet service and
/// feeds WiFi scans through the location resolver.
///
/// Resolution runs on spawned tasks; results come back over an internal
/// channel so a slow positioning call never holds up the uplink loop.
pub struct UplinkPipeline {
    fleet: Arc<FleetService>,
    resolver: Option<Arc<dyn LocationResolver>>,
}

impl UplinkPipeline {
    pub fn new(fleet: Arc<FleetService>, resolver: Option<Arc<dyn LocationResolver>>) -> Self {
        Self { fleet, resolver }
    }

    pub async fn run(
        self,
        mut uplinks: mpsc::Receiver<Uplink>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut sweep = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        let (resolved_tx, mut resolved_rx) = mpsc::channel::<(String, ResolvedLocation)>(16);

        info!("uplink pipeline started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("uplink pipeline stopping");
                    break;
                }
                maybe_uplink = uplinks.recv() => {
                    match maybe_uplink {
                        Some(uplink) => self.handle_uplink(uplink, &resolved_tx).await,
                        None => {
                            warn!("uplink channel closed, stopping pipeline");
                            break;
                        }
                    }
                }
                maybe_resolved = resolved_rx.recv() => {
                    // The loop holds a sender, so this arm never sees None.
                    if let Some((device_id, resolved)) = maybe_resolved {
                        self.fleet.apply_resolved_location(&device_id, resolved).await;
                    }
                }
                _ = sweep.tick() => {
                    let expired = self.fleet.sweep().await;
                    if expired > 0 {
                        debug!(expired, "swept expired commands");
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_uplink(
        &self,
        uplink: Uplink,
        resolved_tx: &mpsc::Sender<(String, ResolvedLocation)>,
    ) {
        let request = match self.fleet.ingest_uplink(uplink).await {
            Some(request) => request,
            None => return,
        };

        let resolver = match self.resolver.as_ref() {
            Some(resolver) => Arc::clone(resolver),
            None => {
                debug!(
                    device_id = %request.device_id,
                    "wifi scan received but no location resolver configured"
                );
                return;
            }
        };

        let tx = resolved_tx.clone();
        tokio::spawn(async move {
            match resolver.resolve(&request.access_points).await {
                Ok(resolved) => {
                    let _ = tx.send((request.device_id, resolved)).await;
                }
                Err(e) => {
                    warn!(
                        device_id = %request.device_id,
                        error = %e,
                        "wifi location resolution failed"
                    );
                }
            }
        });
    }
}
