//! Shared shell state.

use auth_callback::AuthCallbackPayload;
use bridge_ipc::{BridgeServer, Event, EventType};
use host_relay::{HostRelay, WindowSink};
use session_flow::{HttpExchange, SessionController};
use shell_config::{Config, Paths};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything the running shell shares across tasks.
pub struct ShellState {
    pub config: Config,
    pub paths: Paths,
    pub relay: Arc<HostRelay>,
    pub controller: Arc<SessionController<HttpExchange>>,
    /// UI-facing bridge socket.
    pub bridge: Arc<BridgeServer>,
    /// Host-to-host instance socket for second-instance forwarding.
    pub instance: Arc<BridgeServer>,
}

/// Delivers relayed payloads into the sandboxed UI.
///
/// Delivery feeds the session controller and pushes the payload to every
/// connected UI client as a broadcast event.
pub struct BridgeSink {
    bridge: Arc<BridgeServer>,
    controller: Arc<SessionController<HttpExchange>>,
}

impl BridgeSink {
    pub fn new(
        bridge: Arc<BridgeServer>,
        controller: Arc<SessionController<HttpExchange>>,
    ) -> Self {
        Self { bridge, controller }
    }
}

impl WindowSink for BridgeSink {
    fn deliver(&self, payload: AuthCallbackPayload) {
        self.controller.receive_callback(payload.clone());

        match serde_json::to_value(&payload) {
            Ok(data) => self
                .bridge
                .broadcast_event(Event::new(EventType::AuthCallbackDelivered, data)),
            Err(error) => warn!(%error, "Could not serialize callback payload for the UI"),
        }
    }

    fn focus(&self) {
        // The sandboxed UI owns its window; it raises itself when the
        // delivered-callback event arrives.
        debug!("Window focus requested");
    }
}
