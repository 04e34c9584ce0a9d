//! BlueZ backend for the host Bluetooth traits

use crate::transport::traits::{
    BluetoothHost, GattCharacteristic, GattDevice, GattService, RequestOptions,
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bluer::gatt::remote::{Characteristic, Service};
use bluer::{Adapter, AdapterEvent, Address, Device, Uuid};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, trace, warn};

/// Configuration for device discovery on BlueZ
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// How long to scan before giving up
    pub scan_duration: Duration,
    /// How long to wait for GATT services to resolve after connecting
    pub resolve_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_duration: Duration::from_secs(10),
            resolve_timeout: Duration::from_secs(5),
        }
    }
}

/// Snapshot of a device's advertised properties
#[derive(Debug, Clone, Default)]
struct Candidate {
    name: Option<String>,
    services: Vec<String>,
    rssi: Option<i16>,
}

impl Candidate {
    /// BlueZ only reports an RSSI for devices it has heard from recently
    fn in_range(&self) -> bool {
        self.rssi.is_some()
    }

    fn matches(&self, options: &RequestOptions) -> bool {
        options.matches(self.name.as_deref(), &self.services)
    }
}

/// Host Bluetooth stack backed by BlueZ
pub struct BluezHost {
    config: ScanConfig,
}

impl BluezHost {
    /// Create a new BlueZ host
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Get the default Bluetooth adapter
    pub async fn get_adapter() -> Result<Adapter> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        Ok(adapter)
    }

    /// Read what the adapter currently knows about a device
    async fn candidate(adapter: &Adapter, addr: Address) -> Option<Candidate> {
        let device = adapter.device(addr).ok()?;
        let name = device.name().await.ok().flatten();
        let services = device
            .uuids()
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
            .into_iter()
            .map(|uuid| uuid.to_string())
            .collect();
        let rssi = device.rssi().await.ok().flatten();
        Some(Candidate { name, services, rssi })
    }

    async fn is_match(
        adapter: &Adapter,
        addr: Address,
        options: &RequestOptions,
        cached: bool,
    ) -> bool {
        let Some(candidate) = Self::candidate(adapter, addr).await else {
            return false;
        };
        if cached && !candidate.in_range() {
            trace!("[BLE] Skipping cached {} (no RSSI)", addr);
            return false;
        }
        let matched = candidate.matches(options);
        if matched {
            info!(
                "[BLE] Found {} ({})",
                addr,
                candidate.name.as_deref().unwrap_or("unnamed")
            );
        }
        matched
    }

    /// Scan until a device matching `options` shows up
    pub async fn find_device(&self, adapter: &Adapter, options: &RequestOptions) -> Result<Device> {
        // Devices BlueZ already knows about
        for addr in adapter.device_addresses().await? {
            if Self::is_match(adapter, addr, options, true).await {
                return Ok(adapter.device(addr)?);
            }
        }

        // Property changes are reported as repeated DeviceAdded events, so a
        // name that arrives after the first advertisement is matched too
        let discover = adapter.discover_devices_with_changes().await?;
        tokio::pin!(discover);

        let found = timeout(self.config.scan_duration, async {
            while let Some(evt) = discover.next().await {
                if let AdapterEvent::DeviceAdded(addr) = evt {
                    if Self::is_match(adapter, addr, options, false).await {
                        return Some(addr);
                    }
                }
            }
            None
        })
        .await;

        match found {
            Ok(Some(addr)) => Ok(adapter.device(addr)?),
            Ok(None) => Err(anyhow!("Discovery stream ended without a matching device")),
            Err(_) => Err(anyhow!(
                "No matching device found within {:?}",
                self.config.scan_duration
            )),
        }
    }
}

#[async_trait]
impl BluetoothHost for BluezHost {
    async fn request_device(&self, options: &RequestOptions) -> Result<Arc<dyn GattDevice>> {
        let adapter = Self::get_adapter().await?;
        info!("[BLE] Scanning on {}", adapter.name());

        let device = self.find_device(&adapter, options).await?;
        Ok(Arc::new(BluezDevice {
            inner: device,
            resolve_timeout: self.config.resolve_timeout,
        }))
    }
}

/// A BlueZ peripheral
pub struct BluezDevice {
    inner: Device,
    resolve_timeout: Duration,
}

impl BluezDevice {
    async fn wait_services_resolved(&self) -> Result<()> {
        let deadline = Instant::now() + self.resolve_timeout;
        while !self.inner.is_services_resolved().await? {
            if Instant::now() >= deadline {
                bail!("GATT services of {} not resolved", self.inner.address());
            }
            sleep(Duration::from_millis(50)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl GattDevice for BluezDevice {
    fn id(&self) -> String {
        self.inner.address().to_string()
    }

    async fn connect(&self) -> Result<()> {
        if !self.inner.is_connected().await? {
            self.inner.connect().await?;
        }
        self.wait_services_resolved().await
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect().await?;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.inner.is_connected().await.unwrap_or(false)
    }

    async fn primary_service(&self, uuid: &str) -> Result<Arc<dyn GattService>> {
        let target = Uuid::parse_str(uuid)?;

        for service in self.inner.services().await? {
            if service.uuid().await? == target && service.primary().await? {
                return Ok(Arc::new(BluezService {
                    inner: service,
                    uuid: target.to_string(),
                }));
            }
        }

        bail!("Primary service {} not found on {}", uuid, self.inner.address())
    }
}

/// A BlueZ remote service
pub struct BluezService {
    inner: Service,
    uuid: String,
}

#[async_trait]
impl GattService for BluezService {
    fn uuid(&self) -> String {
        self.uuid.clone()
    }

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>> {
        let mut found: Vec<Arc<dyn GattCharacteristic>> = Vec::new();
        for characteristic in self.inner.characteristics().await? {
            let uuid = characteristic.uuid().await?.to_string();
            found.push(Arc::new(BluezCharacteristic {
                inner: characteristic,
                uuid,
            }));
        }
        Ok(found)
    }
}

/// A BlueZ remote characteristic
pub struct BluezCharacteristic {
    inner: Characteristic,
    uuid: String,
}

#[async_trait]
impl GattCharacteristic for BluezCharacteristic {
    fn uuid(&self) -> String {
        self.uuid.clone()
    }

    async fn write_value(&self, value: &[u8]) -> Result<()> {
        self.inner.write(value).await?;
        Ok(())
    }

    async fn start_notifications(&self) -> Result<()> {
        // BlueZ keeps notifications enabled only while the stream is alive,
        // so a background task owns it and discards the values.
        let characteristic = self.inner.clone();
        let uuid = self.uuid.clone();
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(async move {
            let stream = match characteristic.notify().await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            tokio::pin!(stream);

            while let Some(value) = stream.next().await {
                trace!("[BLE] Notification on {}: {:02x?}", uuid, value);
            }
            debug!("[BLE] Notification stream for {} closed", uuid);
        });

        match ready_rx.await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                warn!("[BLE] Notification task for {} ended early", self.uuid);
                Err(anyhow!("Notification task for {} ended early", self.uuid))
            }
        }
    }
}
