//! Session bring-up
//!
//! Runs strictly in sequence: device request, GATT connect, service
//! discovery, characteristic registration, notification enabling. The
//! discovery and notification stages each fan out concurrently and are
//! joined before moving on.

use super::drone::Session;
use super::outcome::{Outcome, Recovery};
use super::registry::CharacteristicRegistry;
use crate::transport::{
    BluetoothHost, DeviceFilter, GattCharacteristic, GattDevice, RequestOptions,
};
use anyhow::{Context, Result};
use futures::future::join_all;
use minidrone_protocol::gatt;
use minidrone_protocol::uuid::resolve;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Filters offered to the host: any MiniDrone name prefix, or either group
/// of core services
pub fn request_options() -> RequestOptions {
    let mut filters: Vec<DeviceFilter> = gatt::NAME_PREFIXES
        .iter()
        .map(|prefix| DeviceFilter::NamePrefix(prefix.to_string()))
        .collect();

    filters.extend(gatt::FILTER_SERVICE_GROUPS.iter().map(|group| {
        DeviceFilter::Services(group.iter().map(|segment| resolve(segment)).collect())
    }));

    RequestOptions { filters }
}

/// Bring the session up against `host`.
///
/// On failure the device handle stays assigned so `disconnect` can still
/// close a half-open GATT connection.
pub(crate) async fn bring_up(session: &Session, host: &dyn BluetoothHost) -> Result<()> {
    let device = host
        .request_device(&request_options())
        .await
        .context("Device request failed")?;
    info!("[SESSION] Selected device {}", device.id());

    // Stored before connecting, see above
    session.attach(device.clone()).await;

    device
        .connect()
        .await
        .with_context(|| format!("GATT connect to {} failed", device.id()))?;
    info!("[SESSION] GATT connected to {}", device.id());

    let registry = discover(device.as_ref()).await?;
    info!(
        "[SESSION] Registered {} characteristics across {} services",
        registry.len(),
        gatt::SERVICES.len()
    );
    session.install_registry(registry).await;

    let enabled = enable_notifications(session).await;
    info!(
        "[SESSION] Notifications enabled on {}/{} characteristics",
        enabled,
        gatt::NOTIFY_CHARACTERISTICS.len()
    );

    Ok(())
}

/// Fetch one primary service and enumerate its characteristics
async fn discover_service(
    device: &dyn GattDevice,
    segment: &str,
) -> Outcome<Vec<Arc<dyn GattCharacteristic>>> {
    let uuid = resolve(segment);

    let result = async {
        let service = device.primary_service(&uuid).await?;
        let characteristics = service.characteristics().await?;
        debug!(
            "[SESSION] Service {} has {} characteristics",
            segment,
            characteristics.len()
        );
        Ok::<_, anyhow::Error>(characteristics)
    }
    .await
    .with_context(|| format!("Discovery of service {} failed", segment));

    result.into()
}

/// Walk all known services concurrently and build the registry
async fn discover(device: &dyn GattDevice) -> Result<CharacteristicRegistry> {
    let outcomes = join_all(
        gatt::SERVICES
            .iter()
            .map(|segment| discover_service(device, segment)),
    )
    .await;

    let mut registry = CharacteristicRegistry::new();
    for outcome in outcomes {
        let Some(characteristics) = outcome.into_result()? else {
            continue;
        };
        for characteristic in characteristics {
            if let Err(e) = registry.register(characteristic) {
                warn!("[SESSION] Skipping characteristic: {}", e);
            }
        }
    }

    Ok(registry)
}

async fn enable_one(session: &Session, segment: &str) -> Outcome {
    let result = async {
        let characteristic = session.characteristic(segment).await?;
        characteristic.start_notifications().await
    }
    .await;

    match result {
        Ok(()) => Outcome::Ok(()),
        Err(error) => {
            warn!("[SESSION] Notifications on {} unavailable: {:#}", segment, error);
            Outcome::Recovered {
                error,
                recovery: Recovery::Skipped,
            }
        }
    }
}

/// Start notifications on every known characteristic; failures are skipped.
///
/// Returns how many were enabled.
async fn enable_notifications(session: &Session) -> usize {
    join_all(
        gatt::NOTIFY_CHARACTERISTICS
            .iter()
            .map(|segment| enable_one(session, segment)),
    )
    .await
    .iter()
    .filter(|outcome| outcome.is_ok())
    .count()
}
