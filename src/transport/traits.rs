//! Host Bluetooth abstraction for pluggable BLE backends
//!
//! The session only talks to the drone through these traits, so the BlueZ
//! backend can be swapped for a test double.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One entry of a device request; a device is offered when any entry matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFilter {
    /// Advertised name starts with the prefix
    NamePrefix(String),
    /// Device advertises every listed service UUID
    Services(Vec<String>),
}

impl DeviceFilter {
    /// Check an advertised name and service set against this filter
    pub fn matches(&self, name: Option<&str>, services: &[String]) -> bool {
        match self {
            DeviceFilter::NamePrefix(prefix) => {
                name.map(|n| n.starts_with(prefix.as_str())).unwrap_or(false)
            }
            DeviceFilter::Services(required) => {
                !required.is_empty()
                    && required
                        .iter()
                        .all(|uuid| services.iter().any(|s| s.eq_ignore_ascii_case(uuid)))
            }
        }
    }
}

/// Criteria handed to [`BluetoothHost::request_device`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// OR'd filter entries
    pub filters: Vec<DeviceFilter>,
}

impl RequestOptions {
    /// Whether any filter entry accepts the advertised data
    pub fn matches(&self, name: Option<&str>, services: &[String]) -> bool {
        self.filters.iter().any(|f| f.matches(name, services))
    }
}

/// Entry point of a host Bluetooth stack
#[async_trait]
pub trait BluetoothHost: Send + Sync {
    /// Select a device matching `options`; fails when none is found or the
    /// selection is cancelled
    async fn request_device(&self, options: &RequestOptions) -> Result<Arc<dyn GattDevice>>;
}

/// A selected peripheral together with its GATT connection
#[async_trait]
pub trait GattDevice: Send + Sync {
    /// Human-readable identifier for logs
    fn id(&self) -> String;

    /// Establish the GATT connection
    async fn connect(&self) -> Result<()>;

    /// Tear the GATT connection down
    async fn disconnect(&self) -> Result<()>;

    /// Transport's own view of the connection
    async fn is_connected(&self) -> bool;

    /// Look up a primary service by full UUID
    async fn primary_service(&self, uuid: &str) -> Result<Arc<dyn GattService>>;
}

/// A primary GATT service
#[async_trait]
pub trait GattService: Send + Sync {
    fn uuid(&self) -> String;

    /// Enumerate the service's characteristics
    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>>;
}

/// A GATT characteristic
#[async_trait]
pub trait GattCharacteristic: Send + Sync {
    fn uuid(&self) -> String;

    /// Write the full characteristic value
    async fn write_value(&self, value: &[u8]) -> Result<()>;

    /// Subscribe to value notifications
    async fn start_notifications(&self) -> Result<()>;
}
