//! Characteristic registry
//!
//! Maps the 4-character segment of each discovered characteristic to its
//! handle. Filled once during bring-up, read by every write.

use crate::transport::GattCharacteristic;
use anyhow::{anyhow, Result};
use minidrone_protocol::uuid::segment_of;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Default)]
pub struct CharacteristicRegistry {
    characteristics: HashMap<String, Arc<dyn GattCharacteristic>>,
}

impl CharacteristicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a characteristic under the segment taken from its UUID.
    ///
    /// Returns the segment it was stored under.
    pub fn register(&mut self, characteristic: Arc<dyn GattCharacteristic>) -> Result<String> {
        let uuid = characteristic.uuid().to_ascii_lowercase();
        let segment = segment_of(&uuid)?.to_string();

        if self
            .characteristics
            .insert(segment.clone(), characteristic)
            .is_some()
        {
            warn!("[SESSION] Characteristic {} registered twice", segment);
        }
        Ok(segment)
    }

    /// Look up a characteristic by segment
    pub fn get(&self, segment: &str) -> Result<Arc<dyn GattCharacteristic>> {
        self.characteristics
            .get(segment)
            .cloned()
            .ok_or_else(|| anyhow!("Characteristic {} not registered", segment))
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.characteristics.contains_key(segment)
    }

    pub fn len(&self) -> usize {
        self.characteristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characteristics.is_empty()
    }
}

impl fmt::Debug for CharacteristicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments: Vec<&String> = self.characteristics.keys().collect();
        segments.sort();
        f.debug_struct("CharacteristicRegistry")
            .field("segments", &segments)
            .finish()
    }
}
