//! In-memory host Bluetooth stack for tests

use crate::transport::traits::{
    BluetoothHost, GattCharacteristic, GattDevice, GattService, RequestOptions,
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use minidrone_protocol::uuid::{resolve, segment_of};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Service → characteristic layout of a healthy drone
const LAYOUT: [(&str, &[&str]); 6] = [
    ("fa00", &["fa0a", "fa0b", "fa0c"]),
    ("fb00", &["fb0e", "fb0f", "fb1b", "fb1c"]),
    ("fc00", &["fc01"]),
    ("fd21", &["fd22", "fd23", "fd24"]),
    ("fd51", &["fd52", "fd53", "fd54"]),
    ("fe00", &["fe01"]),
];

/// Observable state shared between the test and the fake device
#[derive(Debug, Default)]
pub struct MockState {
    pub connected: AtomicBool,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub write_attempts: AtomicUsize,
    pub fail_writes: AtomicBool,
    /// How long each write takes to complete
    pub write_delay: Mutex<Duration>,
    pub writes: Mutex<Vec<(String, Bytes)>>,
    /// Completion time of each successful write, parallel to `writes`
    pub write_times: Mutex<Vec<(String, Instant)>>,
    pub notifications: Mutex<Vec<String>>,
}

impl MockState {
    /// Successful writes to one characteristic, in order
    pub fn writes_to(&self, segment: &str) -> Vec<Bytes> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == segment)
            .map(|(_, b)| b.clone())
            .collect()
    }

    /// Completion times of successful writes to one characteristic
    pub fn write_times_to(&self, segment: &str) -> Vec<Instant> {
        self.write_times
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == segment)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    pub fn disconnects(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Simulate the peripheral dropping the link
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Fake drone exposing the MiniDrone GATT layout
pub struct MockDevice {
    state: Arc<MockState>,
    missing_services: HashSet<String>,
    failing_notifications: HashSet<String>,
    fail_connect: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            missing_services: HashSet::new(),
            failing_notifications: HashSet::new(),
            fail_connect: false,
        }
    }

    pub fn without_service(mut self, segment: &str) -> Self {
        self.missing_services.insert(segment.to_string());
        self
    }

    pub fn with_failing_notifications(mut self, segments: &[&str]) -> Self {
        self.failing_notifications
            .extend(segments.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn state(&self) -> Arc<MockState> {
        self.state.clone()
    }
}

#[async_trait]
impl GattDevice for MockDevice {
    fn id(&self) -> String {
        "RS_MOCK".into()
    }

    async fn connect(&self) -> Result<()> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            bail!("GATT connect refused");
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn primary_service(&self, uuid: &str) -> Result<Arc<dyn GattService>> {
        let segment = segment_of(uuid)?;
        if self.missing_services.contains(segment) {
            bail!("Primary service {} not found", uuid);
        }

        let (_, characteristics) = LAYOUT
            .iter()
            .find(|(s, _)| *s == segment)
            .ok_or_else(|| anyhow!("Primary service {} not found", uuid))?;

        Ok(Arc::new(MockService {
            uuid: uuid.to_string(),
            characteristics: characteristics
                .iter()
                .map(|c| {
                    Arc::new(MockCharacteristic {
                        uuid: resolve(c),
                        segment: c.to_string(),
                        fail_notify: self.failing_notifications.contains(*c),
                        state: self.state.clone(),
                    }) as Arc<dyn GattCharacteristic>
                })
                .collect(),
        }))
    }
}

struct MockService {
    uuid: String,
    characteristics: Vec<Arc<dyn GattCharacteristic>>,
}

#[async_trait]
impl GattService for MockService {
    fn uuid(&self) -> String {
        self.uuid.clone()
    }

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>> {
        Ok(self.characteristics.clone())
    }
}

struct MockCharacteristic {
    uuid: String,
    segment: String,
    fail_notify: bool,
    state: Arc<MockState>,
}

#[async_trait]
impl GattCharacteristic for MockCharacteristic {
    fn uuid(&self) -> String {
        self.uuid.clone()
    }

    async fn write_value(&self, value: &[u8]) -> Result<()> {
        self.state.write_attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.write_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        if self.state.fail_writes.load(Ordering::SeqCst) {
            bail!("GATT write to {} failed", self.segment);
        }
        if !self.state.connected.load(Ordering::SeqCst) {
            bail!("Not connected");
        }
        self.state
            .writes
            .lock()
            .unwrap()
            .push((self.segment.clone(), Bytes::copy_from_slice(value)));
        self.state
            .write_times
            .lock()
            .unwrap()
            .push((self.segment.clone(), Instant::now()));
        Ok(())
    }

    async fn start_notifications(&self) -> Result<()> {
        if self.fail_notify {
            bail!("Notifications not supported on {}", self.segment);
        }
        self.state
            .notifications
            .lock()
            .unwrap()
            .push(self.segment.clone());
        Ok(())
    }
}

/// Host that hands out a single fake device, or nothing
pub struct MockHost {
    device: Mutex<Option<Arc<dyn GattDevice>>>,
    pub requests: Mutex<Vec<RequestOptions>>,
}

impl MockHost {
    pub fn new(device: MockDevice) -> Self {
        Self {
            device: Mutex::new(Some(Arc::new(device))),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A host where the user cancels the selection
    pub fn empty() -> Self {
        Self {
            device: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BluetoothHost for MockHost {
    async fn request_device(&self, options: &RequestOptions) -> Result<Arc<dyn GattDevice>> {
        self.requests.lock().unwrap().push(options.clone());
        self.device
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("Device selection cancelled"))
    }
}

/// Service segment to characteristic segments of the fake drone
pub fn layout_segments() -> HashMap<&'static str, Vec<&'static str>> {
    LAYOUT.iter().map(|(s, c)| (*s, c.to_vec())).collect()
}
