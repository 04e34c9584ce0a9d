//! MiniDrone UUID resolution
//!
//! Every service and characteristic on the drone shares one 128-bit
//! template and differs only in a 4-hex-digit segment:
//! ```text
//! 9a66[ssss]-0800-9191-11e4-012d1540cb8e
//! ```

use crate::ProtocolError;

const PREFIX: &str = "9a66";
const SUFFIX: &str = "-0800-9191-11e4-012d1540cb8e";

/// Build the full UUID string for a segment.
///
/// The segment is not validated; callers only pass segments from
/// [`crate::gatt`].
pub fn resolve(segment: &str) -> String {
    format!("{PREFIX}{segment}{SUFFIX}")
}

/// Extract the 4-character segment (positions 4..8) from a UUID string.
pub fn segment_of(uuid: &str) -> Result<&str, ProtocolError> {
    uuid.get(4..8)
        .ok_or_else(|| ProtocolError::MalformedUuid(uuid.to_string()))
}
