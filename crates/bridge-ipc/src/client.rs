//! Bridge client implementation.

use crate::{BridgeError, BridgeResult, Event, Method, Request, Response};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

/// Client for the bridge socket.
pub struct BridgeClient {
    socket_path: PathBuf,
}

impl BridgeClient {
    /// Create a new bridge client.
    pub fn new(socket_path: &Path) -> Self {
        Self {
            socket_path: socket_path.to_path_buf(),
        }
    }

    /// Send a request and wait for its response.
    ///
    /// Events pushed on the same connection while the response is in flight
    /// are skipped; responses are matched on the request ID.
    pub async fn call(&self, request: Request) -> BridgeResult<Response> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| BridgeError::Socket(format!("Failed to connect: {}", e)))?;

        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let request_json = request.to_json()?;
        writer.write_all(request_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || is_event_line(line) {
                continue;
            }

            let response = Response::from_json(line)?;
            if response.id == request.id || response.id.is_empty() {
                return Ok(response);
            }
        }

        Err(BridgeError::ConnectionClosed)
    }

    /// Send a method call with no parameters.
    pub async fn call_method(&self, method: Method) -> BridgeResult<Response> {
        self.call(Request::new(method)).await
    }

    /// Send a method call with parameters.
    pub async fn call_method_with_params(
        &self,
        method: Method,
        params: serde_json::Value,
    ) -> BridgeResult<Response> {
        self.call(Request::with_params(method, params)).await
    }

    /// Check whether anything is listening on the socket.
    pub async fn is_listening(&self) -> bool {
        UnixStream::connect(&self.socket_path).await.is_ok()
    }

    /// Open a long-lived connection that yields pushed events.
    pub async fn connect_events(&self) -> BridgeResult<EventStream> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| BridgeError::Socket(format!("Failed to connect: {}", e)))?;

        let (reader, writer) = stream.into_split();
        Ok(EventStream {
            lines: BufReader::new(reader).lines(),
            _writer: writer,
        })
    }
}

/// A long-lived connection receiving pushed events.
pub struct EventStream {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    // Kept open so the server sees a live connection.
    _writer: OwnedWriteHalf,
}

impl EventStream {
    /// Wait for the next pushed event. Non-event lines are skipped.
    pub async fn next_event(&mut self) -> BridgeResult<Event> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || !is_event_line(line) {
                continue;
            }
            return Ok(Event::from_json(line)?);
        }

        Err(BridgeError::ConnectionClosed)
    }
}

/// Events carry an `event` field; responses carry `id`.
fn is_event_line(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .map(|v| v.get("event").is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_fails_without_server() {
        let client = BridgeClient::new(Path::new("/tmp/definitely-not-a-bridge-socket.sock"));
        let result = client.call_method(Method::AuthOpenWindow).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_is_listening_false_without_server() {
        let client = BridgeClient::new(Path::new("/tmp/definitely-not-a-bridge-socket.sock"));
        assert!(!client.is_listening().await);
    }

    #[test]
    fn test_event_line_detection() {
        assert!(is_event_line(
            r#"{"event":"auth.deliver_callback","data":{}}"#
        ));
        assert!(!is_event_line(r#"{"id":"1","result":{}}"#));
        assert!(!is_event_line("not json"));
    }
}
