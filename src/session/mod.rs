//! Drone session management
//!
//! This module handles:
//! - Bringing a session up (device request, GATT discovery, notifications)
//! - The characteristic registry consulted by every write
//! - The command surface exposed to callers
//! - The keepalive loop that keeps the drone airborne

mod bring_up;
mod drone;
mod keepalive;
mod outcome;
mod registry;

pub use bring_up::request_options;
pub use drone::{Drone, DroneBuilder};
pub use outcome::{Outcome, Recovery};
pub use registry::CharacteristicRegistry;
