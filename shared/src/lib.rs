//! MiniDrone Shared Protocol Types
//!
//! This crate provides the pure protocol pieces used to drive a Parrot
//! MiniDrone (Rolling Spider, Airborne Cargo, Airborne Night) over BLE:
//! UUID resolution, the fixed GATT layout, command encoding, the velocity
//! vector and the session state machine. Nothing here performs I/O.

pub mod codec;
pub mod sequence;
pub mod state_machine;
pub mod uuid;
pub mod velocity;

use thiserror::Error;

// Re-export commonly used types at crate root
pub use codec::{Command, Destination, FlipDirection};
pub use sequence::SequenceCounters;
pub use state_machine::{SessionEvent, SessionState, SessionStateMachine, TransitionResult};
pub use velocity::{DriveVector, Velocity};

/// Errors raised by the protocol layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("UUID too short to carry a segment: {0:?}")]
    MalformedUuid(String),
}

/// Fixed GATT layout of the MiniDrone family
pub mod gatt {
    /// Advertised name prefixes (Rolling Spider, Airborne Cargo, Airborne Night)
    pub const NAME_PREFIXES: [&str; 3] = ["RS_", "Mars_", "Travis_"];

    /// Service segments offered as device-request filters, grouped per filter entry
    pub const FILTER_SERVICE_GROUPS: [[&str; 2]; 2] = [["fa00", "fb00"], ["fd21", "fd51"]];

    /// Primary services walked during bring-up
    pub const SERVICES: [&str; 6] = ["fa00", "fb00", "fc00", "fd21", "fd51", "fe00"];

    /// Characteristics that get notifications enabled after discovery
    pub const NOTIFY_CHARACTERISTICS: [&str; 10] = [
        "fb0f", "fb0e", "fb1b", "fb1c", "fd22", "fd23", "fd24", "fd52", "fd53", "fd54",
    ];

    /// Movement / keepalive commands (no acknowledgement)
    pub const MOVEMENT_CHARACTERISTIC: &str = "fa0a";

    /// Maneuver commands (take off, land, flips)
    pub const MANEUVER_CHARACTERISTIC: &str = "fa0b";

    /// Emergency land
    pub const EMERGENCY_CHARACTERISTIC: &str = "fa0c";
}

/// Session timing parameters
pub mod timing {
    /// Interval between two keepalive writes, measured from the end of a write
    pub const KEEPALIVE_INTERVAL_MS: u64 = 50;

    /// Delay between a completed bring-up and the first keepalive tick
    pub const SETTLE_DELAY_MS: u64 = 100;
}
