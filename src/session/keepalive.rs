//! Keepalive loop
//!
//! The firmware lands the drone when movement frames stop arriving, so
//! once a session is ready the current velocity is pushed every
//! `keepalive_interval` until the session is torn down. The interval is
//! measured from the end of each write; a slow write delays the next tick.

use super::drone::Session;
use minidrone_protocol::{Command, SessionEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Start the loop after the configured settle delay
pub(crate) fn spawn(session: Arc<Session>) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(session.config().settle_delay).await;
        run(&session).await;
    })
}

/// Whether another tick may be sent
async fn should_continue(session: &Session) -> bool {
    if !session.is_ready().await {
        return false;
    }

    let Some(device) = session.device().await else {
        return false;
    };

    if !device.is_connected().await {
        warn!("[KEEPALIVE] Link to {} lost", device.id());
        session.teardown(SessionEvent::ConnectionLost).await;
        return false;
    }

    true
}

/// Push the velocity until the session leaves `Ready`
pub(crate) async fn run(session: &Session) {
    info!("[KEEPALIVE] Started");
    let mut ticks: u64 = 0;

    while should_continue(session).await {
        let velocity = session.velocity().await;

        if session.send(Command::Movement(velocity)).await.is_recovered() {
            break;
        }
        ticks += 1;

        sleep(session.config().keepalive_interval).await;
    }

    debug!("[KEEPALIVE] Sent {} frames", ticks);
    info!("[KEEPALIVE] Stopped");
}
