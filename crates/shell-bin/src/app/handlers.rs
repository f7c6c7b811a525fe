//! Bridge method registration.
//!
//! The UI-facing socket permits exactly two operations: the open-window
//! request and the delivered-callback event. The instance socket carries
//! only second-instance activation forwarding. Nothing else dispatches.

use crate::app::ShellState;
use bridge_ipc::{error_codes, Method, Response};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn register_handlers(state: &Arc<ShellState>) {
    register_open_window(state).await;
    register_activation_forwarding(state).await;

    // The sandboxed UI connects to the bridge only after its first content
    // load, so its first connection doubles as the created and loaded
    // signals. Any further connection means the window is up and in front,
    // and when the last connection drops the window is gone.
    let connections = Arc::new(AtomicUsize::new(0));
    {
        let relay = state.relay.clone();
        let connections = connections.clone();
        state
            .bridge
            .set_connect_hook(move || {
                if connections.fetch_add(1, Ordering::SeqCst) == 0 {
                    relay.on_window_created();
                    relay.on_window_loaded();
                } else {
                    relay.on_window_focused();
                }
            })
            .await;
    }
    {
        let relay = state.relay.clone();
        let connections = connections.clone();
        state
            .bridge
            .set_disconnect_hook(move || {
                if connections.fetch_sub(1, Ordering::SeqCst) == 1 {
                    relay.on_window_closed();
                }
            })
            .await;
    }
}

/// UI asks the host to run an external authentication flow and waits for
/// the outcome. Resolves exactly once: payload, cancellation, or timeout.
async fn register_open_window(state: &Arc<ShellState>) {
    let relay = state.relay.clone();
    let controller = state.controller.clone();
    let auth_url = format!("{}/auth/start", state.config.exchange_url);

    state
        .bridge
        .register_handler(Method::AuthOpenWindow, move |request| {
            let relay = relay.clone();
            let controller = controller.clone();
            let auth_url = auth_url.clone();

            async move {
                info!(url = %auth_url, "Opening external authentication window");
                if let Err(error) = open_external(&auth_url).await {
                    warn!(%error, "Could not open the external browser");
                    return Response::error(
                        &request.id,
                        error_codes::INTERNAL_ERROR,
                        &format!("Failed to open authentication window: {}", error),
                    );
                }

                let payload = relay.wait_for_payload().await;
                controller.receive_callback(payload.clone());

                match serde_json::to_value(&payload) {
                    Ok(result) => Response::success(&request.id, result),
                    Err(error) => Response::error(
                        &request.id,
                        error_codes::INTERNAL_ERROR,
                        &error.to_string(),
                    ),
                }
            }
        })
        .await;
}

/// A second shell process forwards its deep-link argument here and exits.
async fn register_activation_forwarding(state: &Arc<ShellState>) {
    let relay = state.relay.clone();

    state
        .instance
        .register_handler(Method::ActivationDeepLink, move |request| {
            let relay = relay.clone();

            async move {
                let url = request
                    .params
                    .as_ref()
                    .and_then(|params| params.get("url"))
                    .and_then(|url| url.as_str());

                match url {
                    Some(url) => {
                        relay.handle_activation(url);
                        Response::success(&request.id, serde_json::json!({ "accepted": true }))
                    }
                    None => Response::error(
                        &request.id,
                        error_codes::INVALID_PARAMS,
                        "Missing url parameter",
                    ),
                }
            }
        })
        .await;
}

async fn open_external(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(not(target_os = "macos"))]
    let program = "xdg-open";

    tokio::process::Command::new(program).arg(url).spawn()?;
    Ok(())
}
