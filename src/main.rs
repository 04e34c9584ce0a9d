use minidrone::{Drone, DroneConfig};
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = DroneConfig::default();
    info!("MiniDrone driver starting");
    info!("  Keepalive: {:?}", config.keepalive_interval);
    info!("  Scan window: {:?}", config.scan.scan_duration);

    let drone = Drone::builder()
        .config(config)
        .on_connected(|| info!("[MAIN] Drone connected"))
        .on_disconnected(|| warn!("[MAIN] Drone disconnected"))
        .build();

    drone.connect().await?;

    drone.take_off().await;
    info!("[MAIN] Hovering, press Ctrl-C to land");
    tokio::signal::ctrl_c().await?;

    drone.hover().await;
    drone.land().await;

    // Keep the link up while the drone settles
    tokio::time::sleep(Duration::from_secs(3)).await;
    drone.disconnect().await;

    Ok(())
}
