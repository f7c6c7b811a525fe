//! Delivery orchestration.
//!
//! The relay owns the window-lifecycle machine and the pending slot. Every
//! payload, whatever its source, funnels through [`HostRelay::handle_payload`]
//! and is consumed exactly once: by a blocked open-window waiter, by an
//! immediate delivery into a ready window, or by the slot.

use crate::mailbox::PendingSlot;
use crate::window_fsm::{WindowInput, WindowMachine, WindowState};
use auth_callback::{payload_from_deep_link, payload_from_navigation, AuthCallbackPayload};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Sink for payloads headed into the UI window.
///
/// Delivery is fire-and-forget. A sink that has lost its window should drop
/// the payload silently; the relay has already decided it was deliverable.
pub trait WindowSink: Send + Sync {
    /// Push a payload into the window.
    fn deliver(&self, payload: AuthCallbackPayload);

    /// Bring the window to the foreground.
    fn focus(&self);
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Deep-link scheme this relay answers to (without `://`)
    pub deep_link_scheme: String,
    /// URL prefix that marks an in-window navigation as an auth redirect
    pub success_url_prefix: String,
    /// How long an open-window call may wait for its callback
    pub open_window_timeout: Duration,
}

// Numbered so a timed-out caller only removes its own sender, never a
// replacement registered after the deadline fired.
struct Waiter {
    seq: u64,
    tx: oneshot::Sender<AuthCallbackPayload>,
}

/// Single-instance relay between callback sources and the UI window.
pub struct HostRelay {
    fsm: Mutex<WindowMachine>,
    slot: PendingSlot<AuthCallbackPayload>,
    waiter: Mutex<Option<Waiter>>,
    waiter_seq: AtomicU64,
    sink: Box<dyn WindowSink>,
    config: RelayConfig,
}

impl HostRelay {
    /// Create a relay delivering into the given sink.
    pub fn new(sink: Box<dyn WindowSink>, config: RelayConfig) -> Self {
        Self {
            fsm: Mutex::new(WindowMachine::new()),
            slot: PendingSlot::new(),
            waiter: Mutex::new(None),
            waiter_seq: AtomicU64::new(0),
            sink,
            config,
        }
    }

    /// Current window-lifecycle state.
    pub fn window_state(&self) -> WindowState {
        self.fsm.lock().unwrap().state().clone()
    }

    /// Whether a payload is buffered waiting for the window.
    pub fn has_pending(&self) -> bool {
        !self.slot.is_empty()
    }

    // Lifecycle events arrive from the windowing layer. A transition the
    // machine rejects means events raced or were duplicated; the relay logs
    // and carries on with its current state.
    fn consume_lifecycle(&self, input: WindowInput) {
        let mut fsm = self.fsm.lock().unwrap();
        if fsm.consume(&input).is_err() {
            debug!(state = ?fsm.state(), input = ?input, "Ignoring out-of-order window event");
        }
    }

    /// The UI window was created and is loading its first content.
    pub fn on_window_created(&self) {
        self.consume_lifecycle(WindowInput::WindowCreated);
    }

    /// The UI window finished a content load. Drains the pending slot.
    pub fn on_window_loaded(&self) {
        self.consume_lifecycle(WindowInput::WindowLoaded);

        if let Some(payload) = self.slot.take() {
            info!("Delivering buffered auth callback to freshly loaded window");
            self.sink.deliver(payload);
            self.sink.focus();
        }
    }

    /// The UI window gained focus. Drains the pending slot whenever a
    /// window exists: a focus event can outrun the load event, so focus on
    /// a loading window counts as evidence the content is up and promotes
    /// the machine to ready.
    pub fn on_window_focused(&self) {
        if self.window_state() == WindowState::NoWindow {
            return;
        }
        if let Some(payload) = self.slot.take() {
            {
                let mut fsm = self.fsm.lock().unwrap();
                if *fsm.state() == WindowState::WindowLoading {
                    let _ = fsm.consume(&WindowInput::WindowLoaded);
                }
            }
            info!("Delivering buffered auth callback to focused window");
            self.sink.deliver(payload);
        }
    }

    /// The UI window was closed.
    pub fn on_window_closed(&self) {
        self.consume_lifecycle(WindowInput::WindowClosed);
    }

    /// Route a payload to its single consumer.
    pub fn handle_payload(&self, payload: AuthCallbackPayload) {
        // A blocked open-window call has first claim.
        let payload = match self.waiter.lock().unwrap().take() {
            Some(waiter) => match waiter.tx.send(payload) {
                Ok(()) => {
                    debug!("Auth callback resolved a pending open-window call");
                    return;
                }
                // Waiter gave up between registration and now.
                Err(payload) => payload,
            },
            None => payload,
        };

        if self.window_state() == WindowState::WindowReady {
            self.sink.deliver(payload);
            self.sink.focus();
            return;
        }

        if let Some(displaced) = self.slot.put(payload) {
            warn!(
                displaced_success = displaced.success,
                displaced_message = %displaced.message,
                "Newer auth callback displaced a buffered one"
            );
        }
        info!("Auth callback buffered until the window is ready");
    }

    /// Handle a raw deep-link activation URL.
    ///
    /// URLs outside the configured scheme or auth path are ignored.
    pub fn handle_activation(&self, raw_url: &str) {
        match payload_from_deep_link(raw_url, &self.config.deep_link_scheme) {
            Some(payload) => self.handle_payload(payload),
            None => warn!(url = %raw_url, "Ignoring unrelated deep link"),
        }
    }

    /// Intercept an in-window navigation to the success URL.
    ///
    /// Returns true when the navigation was consumed as an auth redirect and
    /// must not proceed in the window.
    pub fn handle_navigation(&self, raw_url: &str) -> bool {
        match payload_from_navigation(raw_url, &self.config.success_url_prefix) {
            Some(payload) => {
                self.handle_payload(payload);
                true
            }
            None => false,
        }
    }

    /// Block until a payload arrives or the configured timeout elapses.
    ///
    /// Registers this caller as the payload's consumer. A second caller
    /// displaces the first, which resolves as cancelled. On timeout the
    /// caller gets a timed-out failure payload.
    pub async fn wait_for_payload(&self) -> AuthCallbackPayload {
        let (tx, rx) = oneshot::channel();
        let seq = self.waiter_seq.fetch_add(1, Ordering::Relaxed);

        if let Some(previous) = self.waiter.lock().unwrap().replace(Waiter { seq, tx }) {
            let _ = previous.tx.send(AuthCallbackPayload::cancelled());
        }

        match tokio::time::timeout(self.config.open_window_timeout, rx).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(_)) => AuthCallbackPayload::cancelled(),
            Err(_) => {
                // Drop our stale sender so later payloads route normally. The
                // slot may already hold a newer caller's sender; leave that one.
                let mut waiter = self.waiter.lock().unwrap();
                if waiter.as_ref().map(|w| w.seq) == Some(seq) {
                    waiter.take();
                }
                drop(waiter);
                warn!("Open-window call timed out waiting for an auth callback");
                AuthCallbackPayload::timed_out()
            }
        }
    }

    /// Resolve any blocked open-window call as cancelled.
    pub fn cancel_pending(&self) {
        if let Some(waiter) = self.waiter.lock().unwrap().take() {
            let _ = waiter.tx.send(AuthCallbackPayload::cancelled());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<AuthCallbackPayload>>,
        focus_calls: Mutex<usize>,
    }

    impl WindowSink for Arc<RecordingSink> {
        fn deliver(&self, payload: AuthCallbackPayload) {
            self.delivered.lock().unwrap().push(payload);
        }

        fn focus(&self) {
            *self.focus_calls.lock().unwrap() += 1;
        }
    }

    fn test_config() -> RelayConfig {
        RelayConfig {
            deep_link_scheme: "tweakbench".to_string(),
            success_url_prefix: "https://api.tweakbench.app/auth/success".to_string(),
            open_window_timeout: Duration::from_millis(50),
        }
    }

    fn relay_with_sink() -> (HostRelay, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let relay = HostRelay::new(Box::new(sink.clone()), test_config());
        (relay, sink)
    }

    fn accepted(token: &str) -> AuthCallbackPayload {
        AuthCallbackPayload {
            success: true,
            message: "Signed in".to_string(),
            token: Some(token.to_string()),
            user: None,
        }
    }

    #[test]
    fn test_payload_buffered_until_window_ready() {
        let (relay, sink) = relay_with_sink();

        relay.handle_payload(accepted("tok-1"));
        assert!(relay.has_pending());
        assert!(sink.delivered.lock().unwrap().is_empty());

        relay.on_window_created();
        assert!(sink.delivered.lock().unwrap().is_empty());

        relay.on_window_loaded();
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].token.as_deref(), Some("tok-1"));
        assert!(!relay.has_pending());
        assert_eq!(*sink.focus_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_only_newest_buffered_payload_survives() {
        let (relay, sink) = relay_with_sink();

        relay.handle_payload(accepted("tok-1"));
        relay.handle_payload(accepted("tok-2"));
        relay.handle_payload(accepted("tok-3"));

        relay.on_window_created();
        relay.on_window_loaded();

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].token.as_deref(), Some("tok-3"));
    }

    #[test]
    fn test_ready_window_gets_immediate_delivery() {
        let (relay, sink) = relay_with_sink();
        relay.on_window_created();
        relay.on_window_loaded();

        relay.handle_payload(accepted("tok-1"));

        assert!(!relay.has_pending());
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_focus_before_load_event_delivers_buffered_payload() {
        let (relay, sink) = relay_with_sink();

        relay.handle_payload(accepted("tok-1"));
        relay.on_window_created();
        // The load event never arrives; focus stands in for it.
        relay.on_window_focused();

        assert!(!relay.has_pending());
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
        assert_eq!(relay.window_state(), WindowState::WindowReady);

        // A late load event must not redeliver.
        relay.on_window_loaded();
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_focus_without_window_keeps_payload_buffered() {
        let (relay, sink) = relay_with_sink();

        relay.handle_payload(accepted("tok-1"));
        relay.on_window_focused();

        assert!(relay.has_pending());
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reload_does_not_redeliver() {
        let (relay, sink) = relay_with_sink();
        relay.on_window_created();
        relay.on_window_loaded();
        relay.handle_payload(accepted("tok-1"));

        relay.on_window_loaded();
        relay.on_window_focused();

        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_window_close_rebuffers_nothing_but_resets_state() {
        let (relay, sink) = relay_with_sink();
        relay.on_window_created();
        relay.on_window_loaded();
        relay.on_window_closed();

        relay.handle_payload(accepted("tok-1"));
        assert!(relay.has_pending());
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unrelated_deep_link_ignored() {
        let (relay, _sink) = relay_with_sink();
        relay.handle_activation("https://example.com/page");
        relay.handle_activation("tweakbench://settings/open");
        assert!(!relay.has_pending());
    }

    #[test]
    fn test_matching_deep_link_with_bad_data_buffers_failure() {
        let (relay, sink) = relay_with_sink();
        relay.on_window_created();
        relay.on_window_loaded();

        relay.handle_activation("tweakbench://auth/callback?data=%%%");

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(!delivered[0].success);
    }

    #[test]
    fn test_navigation_interception() {
        let (relay, _sink) = relay_with_sink();

        assert!(!relay.handle_navigation("https://api.tweakbench.app/docs"));

        let payload = serde_json::json!({"success": true, "token": "tok-9"}).to_string();
        let url = format!(
            "https://api.tweakbench.app/auth/success?data={}",
            payload.replace('"', "%22").replace('{', "%7B").replace('}', "%7D")
        );
        assert!(relay.handle_navigation(&url));
        assert!(relay.has_pending());
    }

    #[tokio::test]
    async fn test_wait_for_payload_receives_callback() {
        let (relay, sink) = relay_with_sink();
        let relay = Arc::new(relay);

        let waiter = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.wait_for_payload().await })
        };
        tokio::task::yield_now().await;

        relay.handle_payload(accepted("tok-1"));

        let payload = waiter.await.unwrap();
        assert_eq!(payload.token.as_deref(), Some("tok-1"));
        // Consumed by the waiter, not the sink or the slot.
        assert!(sink.delivered.lock().unwrap().is_empty());
        assert!(!relay.has_pending());
    }

    #[tokio::test]
    async fn test_wait_for_payload_times_out() {
        let (relay, _sink) = relay_with_sink();
        let payload = relay.wait_for_payload().await;
        assert!(!payload.success);
        assert_eq!(payload.message, "Authentication timed out");
    }

    #[tokio::test]
    async fn test_second_waiter_cancels_first() {
        let (relay, _sink) = relay_with_sink();
        let relay = Arc::new(relay);

        let first = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.wait_for_payload().await })
        };
        tokio::task::yield_now().await;

        let second = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.wait_for_payload().await })
        };
        tokio::task::yield_now().await;

        let first_payload = first.await.unwrap();
        assert!(!first_payload.success);
        assert!(first_payload.is_cancellation());

        relay.handle_payload(accepted("tok-2"));
        let second_payload = second.await.unwrap();
        assert_eq!(second_payload.token.as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn test_timeout_leaves_later_waiter_registered() {
        let (relay, _sink) = relay_with_sink();
        let relay = Arc::new(relay);

        let first = relay.wait_for_payload().await;
        assert_eq!(first.message, "Authentication timed out");

        // A waiter registered after a timeout must still get its payload;
        // the timed-out caller only removes its own sender.
        let second = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.wait_for_payload().await })
        };
        tokio::task::yield_now().await;

        relay.handle_payload(accepted("tok-5"));
        let payload = second.await.unwrap();
        assert_eq!(payload.token.as_deref(), Some("tok-5"));
    }

    #[tokio::test]
    async fn test_cancel_pending_resolves_waiter() {
        let (relay, _sink) = relay_with_sink();
        let relay = Arc::new(relay);

        let waiter = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.wait_for_payload().await })
        };
        tokio::task::yield_now().await;

        relay.cancel_pending();
        let payload = waiter.await.unwrap();
        assert!(payload.is_cancellation());
    }
}
