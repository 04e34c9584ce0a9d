//! Host Bluetooth transport
//!
//! This module handles:
//! - The trait seam the session uses to reach a host Bluetooth stack
//! - The BlueZ implementation used by default
//! - An in-memory test double

pub mod bluez;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use bluez::{BluezHost, ScanConfig};
pub use traits::{
    BluetoothHost, DeviceFilter, GattCharacteristic, GattDevice, GattService, RequestOptions,
};
