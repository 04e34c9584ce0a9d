//! Drone command surface

use super::outcome::{Outcome, Recovery};
use super::registry::CharacteristicRegistry;
use super::{bring_up, keepalive};
use crate::config::DroneConfig;
use crate::transport::{BluetoothHost, BluezHost, GattCharacteristic, GattDevice};
use anyhow::{bail, Result};
use bytes::Bytes;
use minidrone_protocol::{
    Command, Destination, DriveVector, FlipDirection, SequenceCounters, SessionEvent,
    SessionState, SessionStateMachine, TransitionResult, Velocity,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle callback, invoked with no arguments
type Callback = Arc<dyn Fn() + Send + Sync>;

/// State owned by one session and shared with its keepalive task
pub(crate) struct Session {
    config: DroneConfig,
    fsm: RwLock<SessionStateMachine>,
    device: RwLock<Option<Arc<dyn GattDevice>>>,
    registry: RwLock<CharacteristicRegistry>,
    velocity: RwLock<Velocity>,
    counters: SequenceCounters,
    keepalive: Mutex<Option<JoinHandle<()>>>,
    on_connected: Callback,
    on_disconnected: Callback,
}

impl Session {
    pub(crate) fn config(&self) -> &DroneConfig {
        &self.config
    }

    pub(crate) async fn attach(&self, device: Arc<dyn GattDevice>) {
        *self.device.write().await = Some(device);
    }

    pub(crate) async fn device(&self) -> Option<Arc<dyn GattDevice>> {
        self.device.read().await.clone()
    }

    pub(crate) async fn install_registry(&self, registry: CharacteristicRegistry) {
        *self.registry.write().await = registry;
    }

    pub(crate) async fn characteristic(&self, segment: &str) -> Result<Arc<dyn GattCharacteristic>> {
        self.registry.read().await.get(segment)
    }

    pub(crate) async fn velocity(&self) -> Velocity {
        *self.velocity.read().await
    }

    pub(crate) async fn is_ready(&self) -> bool {
        self.fsm.read().await.is_ready()
    }

    /// Apply a lifecycle event, firing `on_disconnected` on entry to
    /// `Disconnected`
    pub(crate) async fn transition(&self, event: SessionEvent) -> TransitionResult {
        let result = self.fsm.write().await.process_event(event);

        match &result {
            TransitionResult::Success {
                state,
                changed: true,
            } => info!("[SESSION] State -> {} ({:?})", state, event),
            TransitionResult::Success { .. } => {}
            TransitionResult::Invalid { from, event } => {
                debug!("[SESSION] Ignored {:?} while {}", event, from)
            }
        }

        if result.entered_disconnected() {
            (self.on_disconnected)();
        }
        result
    }

    /// Close the transport if it is still up and drop the device handle
    pub(crate) async fn teardown(&self, event: SessionEvent) {
        let device = self.device.write().await.take();

        if let Some(device) = device {
            if device.is_connected().await {
                info!("[SESSION] Disconnecting from {}", device.id());
                if let Err(e) = device.disconnect().await {
                    warn!("[SESSION] Disconnect from {} failed: {:#}", device.id(), e);
                }
            }
        }

        self.transition(event).await;
    }

    /// Write a raw value; on failure the session is torn down and the error
    /// absorbed
    pub(crate) async fn write(&self, segment: &str, payload: Bytes) -> Outcome {
        let result = async {
            let characteristic = self.characteristic(segment).await?;
            characteristic.write_value(&payload).await
        }
        .await;

        match result {
            Ok(()) => Outcome::Ok(()),
            Err(error) => {
                error!("[SESSION] Write to {} failed: {:#}", segment, error);
                self.teardown(SessionEvent::ConnectionLost).await;
                Outcome::Recovered {
                    error,
                    recovery: Recovery::Disconnected,
                }
            }
        }
    }

    /// Stamp a command with its destination's next sequence number and send it
    pub(crate) async fn send(&self, command: Command) -> Outcome {
        let destination = command.destination();
        let seq = self.counters.next(destination);
        self.write(destination.segment(), command.encode(seq)).await
    }
}

/// Builder for a [`Drone`]
pub struct DroneBuilder {
    config: DroneConfig,
    on_connected: Option<Callback>,
    on_disconnected: Option<Callback>,
}

impl DroneBuilder {
    pub fn config(mut self, config: DroneConfig) -> Self {
        self.config = config;
        self
    }

    /// Called once when bring-up completes
    pub fn on_connected<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connected = Some(Arc::new(callback));
        self
    }

    /// Called once when the session is torn down or bring-up fails
    pub fn on_disconnected<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_disconnected = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Drone {
        let noop: Callback = Arc::new(|| {});

        Drone {
            session: Arc::new(Session {
                config: self.config,
                fsm: RwLock::new(SessionStateMachine::new()),
                device: RwLock::new(None),
                registry: RwLock::new(CharacteristicRegistry::new()),
                velocity: RwLock::new(Velocity::HOVER),
                counters: SequenceCounters::new(),
                keepalive: Mutex::new(None),
                on_connected: self.on_connected.unwrap_or_else(|| noop.clone()),
                on_disconnected: self.on_disconnected.unwrap_or(noop),
            }),
        }
    }
}

/// A single MiniDrone session.
///
/// Connect once; after a disconnect a new `Drone` is needed. Immediate
/// commands are fire-and-forget and return an [`Outcome`] rather than an
/// error: a failed write disconnects the session.
#[derive(Clone)]
pub struct Drone {
    session: Arc<Session>,
}

impl Default for Drone {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Drone {
    pub fn builder() -> DroneBuilder {
        DroneBuilder {
            config: DroneConfig::default(),
            on_connected: None,
            on_disconnected: None,
        }
    }

    /// Connect through the system's BlueZ stack
    pub async fn connect(&self) -> Result<()> {
        let host = BluezHost::new(self.session.config.scan.clone());
        self.connect_with(&host).await
    }

    /// Connect through the given host Bluetooth stack
    pub async fn connect_with(&self, host: &dyn BluetoothHost) -> Result<()> {
        if let TransitionResult::Invalid { from, .. } =
            self.session.transition(SessionEvent::ConnectRequested).await
        {
            bail!("Cannot connect a session that is {}", from);
        }

        if let Err(e) = bring_up::bring_up(&self.session, host).await {
            error!("[SESSION] Bring-up failed: {:#}", e);
            self.session.transition(SessionEvent::BringUpFailed).await;
            return Err(e);
        }

        if let TransitionResult::Invalid { from, .. } =
            self.session.transition(SessionEvent::BringUpComplete).await
        {
            bail!("Session became {} during bring-up", from);
        }

        (self.session.on_connected)();
        *self.session.keepalive.lock().await = Some(keepalive::spawn(self.session.clone()));
        Ok(())
    }

    /// Disconnect; safe to call any number of times.
    ///
    /// Returns once the keepalive loop has exited.
    pub async fn disconnect(&self) {
        self.session
            .teardown(SessionEvent::DisconnectRequested)
            .await;

        let handle = self.session.keepalive.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("[KEEPALIVE] Task ended abnormally: {}", e);
            }
        }
    }

    pub async fn take_off(&self) -> Outcome {
        info!("[SESSION] Take off");
        self.session.send(Command::TakeOff).await
    }

    pub async fn land(&self) -> Outcome {
        info!("[SESSION] Land");
        self.session.send(Command::Land).await
    }

    pub async fn back_flip(&self) -> Outcome {
        self.flip(FlipDirection::Back).await
    }

    pub async fn front_flip(&self) -> Outcome {
        self.flip(FlipDirection::Front).await
    }

    pub async fn right_flip(&self) -> Outcome {
        self.flip(FlipDirection::Right).await
    }

    pub async fn left_flip(&self) -> Outcome {
        self.flip(FlipDirection::Left).await
    }

    async fn flip(&self, direction: FlipDirection) -> Outcome {
        info!("[SESSION] Flip {:?}", direction);
        self.session.send(Command::Flip(direction)).await
    }

    /// Cut the motors and drop. Use only when something has gone wrong.
    pub async fn emergency_land(&self) -> Outcome {
        warn!("[SESSION] EMERGENCY LAND");
        self.session.send(Command::EmergencyLand).await
    }

    /// Zero all axes; takes effect on the next keepalive tick
    pub async fn hover(&self) {
        self.session.velocity.write().await.hover();
    }

    /// Replace the velocity; unset axes become zero
    pub async fn drive(&self, drive: impl Into<DriveVector>) {
        let drive = drive.into();
        debug!("[SESSION] Drive {:?}", drive);
        self.session.velocity.write().await.drive(drive);
    }

    pub async fn velocity(&self) -> Velocity {
        self.session.velocity().await
    }

    pub async fn state(&self) -> SessionState {
        self.session.fsm.read().await.state()
    }

    /// Whether a device handle is currently held
    pub async fn has_device(&self) -> bool {
        self.session.device.read().await.is_some()
    }

    /// Last sequence number sent to a destination characteristic
    pub fn sequence(&self, destination: Destination) -> u8 {
        self.session.counters.current(destination)
    }
}
