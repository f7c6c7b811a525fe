//! Shell startup wiring.

use crate::app::handlers::register_handlers;
use crate::app::state::{BridgeSink, ShellState};
use bridge_ipc::BridgeServer;
use host_relay::{
    check_singleton, cleanup_pid_file, forward_activation, write_pid_file, HostRelay, RelayConfig,
    SingletonCheck,
};
use session_flow::{HttpExchange, SessionController};
use shell_config::{Config, Paths};
use shell_storage::create_session_store;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Run the shell host process.
pub async fn run_shell(
    config: Config,
    paths: Paths,
    activation_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Singleton enforcement: exactly one shell owns deep-link handling.
    let instance_socket = paths.instance_socket();
    match check_singleton(&instance_socket) {
        SingletonCheck::AlreadyRunning => {
            if let Some(url) = activation_url {
                if let Err(error) = forward_activation(&instance_socket, &url).await {
                    warn!(%error, "Could not forward activation to the running instance");
                }
            }
            info!("Shell is already running, exiting");
            return Ok(());
        }
        SingletonCheck::StaleSocketCleaned => {
            info!("Removed stale instance socket from a previous run");
        }
        SingletonCheck::Available => {}
    }

    paths.ensure_base_dir()?;
    write_pid_file(&paths.pid_file())?;
    info!(
        pid = std::process::id(),
        exchange_url = %config.exchange_url,
        deep_link_scheme = %config.deep_link_scheme,
        "Shell started"
    );

    let bridge = Arc::new(BridgeServer::new(&paths.bridge_socket()));
    let instance = Arc::new(BridgeServer::new(&instance_socket));

    let store = create_session_store(&paths.session_store())?;
    let controller = Arc::new(SessionController::new(
        HttpExchange::new(&config.exchange_url),
        store,
    ));

    let sink = BridgeSink::new(bridge.clone(), controller.clone());
    let relay = Arc::new(HostRelay::new(
        Box::new(sink),
        RelayConfig {
            deep_link_scheme: config.deep_link_scheme.clone(),
            success_url_prefix: config.success_url_prefix.clone(),
            open_window_timeout: Duration::from_secs(config.open_window_timeout_secs),
        },
    ));

    let state = Arc::new(ShellState {
        config,
        paths: paths.clone(),
        relay,
        controller,
        bridge,
        instance,
    });
    register_handlers(&state).await;

    let bridge_task = tokio::spawn({
        let bridge = state.bridge.clone();
        async move {
            if let Err(error) = bridge.run().await {
                error!(%error, "Bridge server failed");
            }
        }
    });
    let instance_task = tokio::spawn({
        let instance = state.instance.clone();
        async move {
            if let Err(error) = instance.run().await {
                error!(%error, "Instance server failed");
            }
        }
    });

    // One validation pass per process; terminates the initial loading state.
    state.controller.validate_on_startup().await;

    // A deep link may have launched this very process.
    if let Some(url) = activation_url {
        state.relay.handle_activation(&url);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    state.relay.cancel_pending();
    state.bridge.shutdown();
    state.instance.shutdown();
    let _ = bridge_task.await;
    let _ = instance_task.await;
    cleanup_pid_file(&paths.pid_file());

    info!("Shell stopped");
    Ok(())
}
