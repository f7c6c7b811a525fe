//! Bridge server implementation.
//!
//! Listens on a Unix domain socket. Every accepted connection can send
//! requests (dispatched against the registered-handler allow list) and
//! receives every broadcast event as an NDJSON line. A request for a method
//! with no registered handler is answered with `method_not_found` — that is
//! the entire enforcement surface of the allow list.

use crate::{error_codes, BridgeError, BridgeResult, Event, Method, Request, Response};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

/// Handler function type for bridge methods.
pub type HandlerFn =
    Box<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

/// Callback invoked when a client connection is accepted or ends.
pub type ConnectHook = Box<dyn Fn() + Send + Sync>;

/// Bridge server that listens on a Unix domain socket.
pub struct BridgeServer {
    socket_path: PathBuf,
    handlers: Arc<RwLock<HashMap<Method, HandlerFn>>>,
    events_tx: broadcast::Sender<Event>,
    shutdown_tx: broadcast::Sender<()>,
    connect_hook: Arc<RwLock<Option<ConnectHook>>>,
    disconnect_hook: Arc<RwLock<Option<ConnectHook>>>,
}

impl BridgeServer {
    /// Create a new bridge server.
    pub fn new(socket_path: &Path) -> Self {
        let (events_tx, _) = broadcast::channel(16);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            socket_path: socket_path.to_path_buf(),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            events_tx,
            shutdown_tx,
            connect_hook: Arc::new(RwLock::new(None)),
            disconnect_hook: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a handler for a method. Only registered methods are
    /// dispatchable; everything else is rejected.
    pub async fn register_handler<F, Fut>(&self, method: Method, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let boxed_handler: HandlerFn = Box::new(move |req| Box::pin(handler(req)));
        self.handlers.write().await.insert(method, boxed_handler);
    }

    /// Register a callback for accepted connections.
    pub async fn set_connect_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.connect_hook.write().await = Some(Box::new(hook));
    }

    /// Register a callback for connections that have ended.
    pub async fn set_disconnect_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.disconnect_hook.write().await = Some(Box::new(hook));
    }

    /// Push an event to every connected client. Send errors (no clients)
    /// are ignored: delivery is fire-and-forget.
    pub fn broadcast_event(&self, event: Event) {
        let _ = self.events_tx.send(event);
    }

    /// Get a shutdown receiver.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Trigger shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Start the server and listen for connections.
    pub async fn run(&self) -> BridgeResult<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .map_err(|e| BridgeError::Socket(format!("Failed to bind: {}", e)))?;

        info!(socket = %self.socket_path.display(), "Bridge server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            if let Some(hook) = self.connect_hook.read().await.as_ref() {
                                hook();
                            }

                            let handlers = self.handlers.clone();
                            let events_rx = self.events_tx.subscribe();
                            let disconnect_hook = self.disconnect_hook.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handlers, events_rx).await {
                                    debug!("Connection ended: {}", e);
                                }
                                if let Some(hook) = disconnect_hook.read().await.as_ref() {
                                    hook();
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Bridge server shutting down");
                    break;
                }
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
        Ok(())
    }
}

async fn handle_connection(
    stream: UnixStream,
    handlers: Arc<RwLock<HashMap<Method, HandlerFn>>>,
    mut events_rx: broadcast::Receiver<Event>,
) -> BridgeResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = match Request::from_json(line.trim()) {
                    Ok(request) => dispatch(&handlers, request).await,
                    Err(e) => {
                        warn!("Unparseable bridge request: {}", e);
                        Response::error("", error_codes::PARSE_ERROR, &e.to_string())
                    }
                };

                write_line(&mut writer, &response.to_json()?).await?;
            }
            event = events_rx.recv() => {
                match event {
                    Ok(event) => write_line(&mut writer, &event.to_json()?).await?,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Client lagged behind event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}

async fn dispatch(handlers: &RwLock<HashMap<Method, HandlerFn>>, request: Request) -> Response {
    let handlers = handlers.read().await;
    match handlers.get(&request.method) {
        Some(handler) => {
            debug!(method = ?request.method, id = %request.id, "Dispatching bridge request");
            handler(request).await
        }
        None => {
            warn!(method = ?request.method, "Rejected method not in the bridge allow list");
            Response::error(
                &request.id,
                error_codes::METHOD_NOT_FOUND,
                "Method not permitted on this bridge",
            )
        }
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> BridgeResult<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BridgeClient, EventType};
    use std::time::Duration;

    async fn start_server(server: Arc<BridgeServer>) {
        tokio::spawn({
            let server = server.clone();
            async move {
                let _ = server.run().await;
            }
        });
        // Wait until the socket file exists
        for _ in 0..100 {
            if server.socket_path.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("server did not start");
    }

    #[tokio::test]
    async fn test_registered_method_dispatches() {
        let temp = tempfile::TempDir::new().unwrap();
        let server = Arc::new(BridgeServer::new(&temp.path().join("bridge.sock")));
        server
            .register_handler(Method::ActivationDeepLink, |req| async move {
                Response::success(&req.id, serde_json::json!({"forwarded": true}))
            })
            .await;
        start_server(server.clone()).await;

        let client = BridgeClient::new(&temp.path().join("bridge.sock"));
        let response = client
            .call(Request::with_params(
                Method::ActivationDeepLink,
                serde_json::json!({"url": "tweakbench://auth/callback"}),
            ))
            .await
            .unwrap();

        assert!(response.is_success());
        server.shutdown();
    }

    #[tokio::test]
    async fn test_unregistered_method_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let server = Arc::new(BridgeServer::new(&temp.path().join("bridge.sock")));
        start_server(server.clone()).await;

        let client = BridgeClient::new(&temp.path().join("bridge.sock"));
        let response = client.call(Request::new(Method::AuthOpenWindow)).await.unwrap();

        assert!(!response.is_success());
        assert_eq!(
            response.error.unwrap().code,
            error_codes::METHOD_NOT_FOUND
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn test_event_broadcast_reaches_subscriber() {
        let temp = tempfile::TempDir::new().unwrap();
        let server = Arc::new(BridgeServer::new(&temp.path().join("bridge.sock")));
        start_server(server.clone()).await;

        let client = BridgeClient::new(&temp.path().join("bridge.sock"));
        let mut events = client.connect_events().await.unwrap();

        // Give the connection task time to subscribe before broadcasting.
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.broadcast_event(Event::new(
            EventType::AuthCallbackDelivered,
            serde_json::json!({"success": true, "message": "ok"}),
        ));

        let event = tokio::time::timeout(Duration::from_secs(2), events.next_event())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type, EventType::AuthCallbackDelivered);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_connect_hook_fires() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let temp = tempfile::TempDir::new().unwrap();
        let server = Arc::new(BridgeServer::new(&temp.path().join("bridge.sock")));
        let connects = Arc::new(AtomicUsize::new(0));
        {
            let connects = connects.clone();
            server
                .set_connect_hook(move || {
                    connects.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }
        start_server(server.clone()).await;

        let client = BridgeClient::new(&temp.path().join("bridge.sock"));
        let _ = client.call(Request::new(Method::AuthOpenWindow)).await;

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_disconnect_hook_fires_when_connection_ends() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let temp = tempfile::TempDir::new().unwrap();
        let server = Arc::new(BridgeServer::new(&temp.path().join("bridge.sock")));
        let disconnects = Arc::new(AtomicUsize::new(0));
        {
            let disconnects = disconnects.clone();
            server
                .set_disconnect_hook(move || {
                    disconnects.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }
        start_server(server.clone()).await;

        let client = BridgeClient::new(&temp.path().join("bridge.sock"));
        let _ = client.call(Request::new(Method::AuthOpenWindow)).await;

        // The connection task notices the close asynchronously.
        for _ in 0..100 {
            if disconnects.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        server.shutdown();
    }
}
