//! BLE control driver for Parrot MiniDrone quadcopters
//!
//! A [`Drone`] discovers the device through a host Bluetooth stack, walks
//! its GATT layout and then exposes take off, land, flips, emergency land,
//! hover and drive. While connected, a keepalive task streams the current
//! velocity every 50ms; the firmware lands the drone when it stops.

pub mod config;
pub mod session;
pub mod transport;

pub use config::DroneConfig;
pub use minidrone_protocol::{DriveVector, SessionState, Velocity};
pub use session::{Drone, DroneBuilder, Outcome, Recovery};
pub use transport::{BluetoothHost, BluezHost, ScanConfig};
