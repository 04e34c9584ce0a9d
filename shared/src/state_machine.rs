//! Session State Machine
//!
//! Defines the lifecycle of a single drone session and the guarded
//! transitions between its states. A session never leaves
//! `Disconnected`; reconnecting requires a new session.

use std::fmt;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created, connect not yet requested
    #[default]
    Idle,
    /// Device request, GATT connect and discovery in progress
    Connecting,
    /// Bring-up complete, keepalive allowed to run
    Ready,
    /// Torn down (by request, write failure or bring-up failure)
    Disconnected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Caller asked to connect
    ConnectRequested,
    /// Discovery and notification enabling finished
    BringUpComplete,
    /// Device request, connect or discovery failed
    BringUpFailed,
    /// A characteristic write failed or the transport dropped
    ConnectionLost,
    /// Caller asked to disconnect
    DisconnectRequested,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid; `changed` is false for idempotent repeats
    Success { state: SessionState, changed: bool },
    /// Transition was invalid from current state
    Invalid { from: SessionState, event: SessionEvent },
}

impl TransitionResult {
    /// True when the transition moved the session into `Disconnected`
    pub fn entered_disconnected(&self) -> bool {
        matches!(
            self,
            TransitionResult::Success {
                state: SessionState::Disconnected,
                changed: true,
            }
        )
    }
}

/// The session state machine
#[derive(Debug, Default)]
pub struct SessionStateMachine {
    current_state: SessionState,
}

impl SessionStateMachine {
    /// Create a new state machine in Idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.current_state
    }

    /// Whether the keepalive loop may keep ticking
    pub fn is_ready(&self) -> bool {
        self.current_state == SessionState::Ready
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: SessionEvent) -> TransitionResult {
        match next_state(self.current_state, event) {
            Some(state) => {
                let changed = state != self.current_state;
                self.current_state = state;
                TransitionResult::Success { state, changed }
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }
}

/// Get the next state for a given event, if the transition is valid
fn next_state(from: SessionState, event: SessionEvent) -> Option<SessionState> {
    use SessionEvent::*;
    use SessionState::*;

    match (from, event) {
        (Idle, ConnectRequested) => Some(Connecting),

        (Connecting, BringUpComplete) => Some(Ready),
        (Connecting, BringUpFailed) => Some(Disconnected),

        // Nothing to tear down yet
        (Idle, ConnectionLost | DisconnectRequested) => Some(Idle),

        // Tearing down is allowed from every other state and is idempotent
        (_, ConnectionLost | DisconnectRequested) => Some(Disconnected),

        _ => None,
    }
}
