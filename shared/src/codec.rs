//! Command payload encoding
//!
//! Every command is a short fixed-layout frame written as the whole value
//! of one characteristic:
//! ```text
//! [ kind ][ seq ][ project ][ class ][ command ... ]
//! ```
//! `seq` is the per-characteristic sequence counter, see
//! [`crate::sequence::SequenceCounters`].

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::velocity::Velocity;
use crate::gatt;

/// Frame kind for non-acknowledged data (movement, emergency)
const KIND_DATA: u8 = 2;
/// Frame kind for acknowledged data (maneuvers)
const KIND_DATA_WITH_ACK: u8 = 4;

/// Project id of the MiniDrone command set
const PROJECT_MINIDRONE: u8 = 2;

const CLASS_PILOTING: u8 = 0;
const CLASS_ANIMATIONS: u8 = 4;

const PILOTING_TAKE_OFF: u8 = 1;
const PILOTING_PCMD: u8 = 2;
const PILOTING_LANDING: u8 = 3;
const PILOTING_EMERGENCY: u8 = 4;

const ANIMATION_FLIP: u8 = 0;

/// Length of the movement frame including its zero padding
pub const MOVEMENT_FRAME_LEN: usize = 19;

/// Characteristic a command is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// fa0a, movement and keepalive
    Movement,
    /// fa0b, take off, land, flips
    Maneuver,
    /// fa0c, emergency land
    Emergency,
}

impl Destination {
    /// The characteristic segment this destination writes to
    pub fn segment(&self) -> &'static str {
        match self {
            Destination::Movement => gatt::MOVEMENT_CHARACTERISTIC,
            Destination::Maneuver => gatt::MANEUVER_CHARACTERISTIC,
            Destination::Emergency => gatt::EMERGENCY_CHARACTERISTIC,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Flip direction codes as understood by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlipDirection {
    Back = 0,
    Front = 1,
    Right = 2,
    Left = 3,
}

/// A command the driver can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Continuous velocity push (keepalive)
    Movement(Velocity),
    TakeOff,
    Land,
    Flip(FlipDirection),
    EmergencyLand,
}

impl Command {
    /// Characteristic the command is written to
    pub fn destination(&self) -> Destination {
        match self {
            Command::Movement(_) => Destination::Movement,
            Command::TakeOff | Command::Land | Command::Flip(_) => Destination::Maneuver,
            Command::EmergencyLand => Destination::Emergency,
        }
    }

    /// Encode the command with the given sequence counter value
    pub fn encode(&self, seq: u8) -> Bytes {
        match self {
            Command::Movement(velocity) => encode_movement(seq, velocity),
            Command::TakeOff => encode_piloting(KIND_DATA_WITH_ACK, seq, PILOTING_TAKE_OFF),
            Command::Land => encode_piloting(KIND_DATA_WITH_ACK, seq, PILOTING_LANDING),
            Command::Flip(direction) => encode_flip(seq, *direction),
            Command::EmergencyLand => encode_piloting(KIND_DATA, seq, PILOTING_EMERGENCY),
        }
    }
}

/// Encode a movement frame.
///
/// Axes go on the wire as x, y, w, z: yaw comes before the vertical axis.
pub fn encode_movement(seq: u8, velocity: &Velocity) -> Bytes {
    let mut buf = BytesMut::with_capacity(MOVEMENT_FRAME_LEN);

    buf.put_u8(KIND_DATA);
    buf.put_u8(seq);
    buf.put_u8(PROJECT_MINIDRONE);
    buf.put_u8(CLASS_PILOTING);
    buf.put_u8(PILOTING_PCMD);
    buf.put_u8(0);
    buf.put_u8(u8::from(velocity.is_moving()));
    buf.put_i8(velocity.x);
    buf.put_i8(velocity.y);
    buf.put_i8(velocity.w);
    buf.put_i8(velocity.z);

    // Timestamp field, unused by the firmware
    buf.put_bytes(0, MOVEMENT_FRAME_LEN - buf.len());

    buf.freeze()
}

fn encode_piloting(kind: u8, seq: u8, command: u8) -> Bytes {
    Bytes::copy_from_slice(&[kind, seq, PROJECT_MINIDRONE, CLASS_PILOTING, command, 0])
}

fn encode_flip(seq: u8, direction: FlipDirection) -> Bytes {
    let mut buf = BytesMut::with_capacity(10);

    buf.put_u8(KIND_DATA_WITH_ACK);
    buf.put_u8(seq);
    buf.put_u8(PROJECT_MINIDRONE);
    buf.put_u8(CLASS_ANIMATIONS);
    buf.put_u8(ANIMATION_FLIP);
    buf.put_u8(0);
    // Direction is a little-endian u32 enum
    buf.put_u32_le(direction as u32);

    buf.freeze()
}
