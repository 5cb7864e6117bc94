//! NDJSON request client over a Unix domain socket.

use crate::{RequestChannel, RpcError, RpcResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracker_protocol::{Method, Request, Response};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the tracker language server.
///
/// Each call opens a connection, writes one request line and reads one
/// response line.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request watchdog.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a request and wait for its response, bounded by the watchdog.
    pub async fn call(&self, request: Request) -> RpcResult<Response> {
        tokio::time::timeout(self.timeout, self.exchange(&request))
            .await
            .map_err(|_| RpcError::Timeout(self.timeout))?
    }

    #[cfg(unix)]
    async fn exchange(&self, request: &Request) -> RpcResult<Response> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::UnixStream;

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| RpcError::Socket(format!("Failed to connect: {}", e)))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let request_json = request.to_json()?;
        writer.write_all(request_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        let mut line = String::new();
        reader.read_line(&mut line).await?;

        if line.is_empty() {
            return Err(RpcError::ConnectionClosed);
        }

        let response = Response::from_json(line.trim())?;
        if response.id != request.id {
            return Err(RpcError::Protocol(format!(
                "response id {} does not match request {}",
                response.id, request.id
            )));
        }
        Ok(response)
    }

    #[cfg(not(unix))]
    async fn exchange(&self, _request: &Request) -> RpcResult<Response> {
        Err(RpcError::Socket(format!(
            "Cannot reach {}: Unix domain sockets are not supported on this platform",
            self.socket_path.display()
        )))
    }
}

#[async_trait]
impl RequestChannel for IpcClient {
    async fn send_request(
        &self,
        method: Method,
        params: serde_json::Value,
    ) -> RpcResult<serde_json::Value> {
        let request = Request::with_params(method, params);
        debug!(method = %method, id = %request.id, "Sending tracker request");

        let response = self.call(request).await?;
        if let Some(error) = response.error {
            return Err(RpcError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixListener;
    use tracker_protocol::error_codes;

    /// Serve a single connection, answering with `reply(request)`.
    async fn serve_once<F>(listener: UnixListener, reply: F)
    where
        F: FnOnce(Request) -> Response + Send + 'static,
    {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();

        let request = Request::from_json(line.trim()).unwrap();
        let response = reply(request).to_json().unwrap();
        writer.write_all(response.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_request_returns_result() {
        let dir = tempdir().unwrap();
        let socket = dir.path().join("tracker.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = tokio::spawn(serve_once(listener, |req| {
            assert_eq!(req.method, Method::StopTracker);
            assert_eq!(req.params, Some(serde_json::json!({})));
            Response::success(
                &req.id,
                serde_json::json!({ "emissions": 0.5, "emissions_file": "f.csv" }),
            )
        }));

        let client = IpcClient::new(&socket);
        let result = client
            .send_request(Method::StopTracker, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["emissions"], 0.5);
        assert_eq!(result["emissions_file"], "f.csv");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_result_is_null() {
        let dir = tempdir().unwrap();
        let socket = dir.path().join("tracker.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = tokio::spawn(serve_once(listener, |req| Response {
            id: req.id,
            result: None,
            error: None,
        }));

        let result = IpcClient::new(&socket)
            .send_request(Method::StartTracker, serde_json::json!({}))
            .await
            .unwrap();
        assert!(result.is_null());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_remote_error() {
        let dir = tempdir().unwrap();
        let socket = dir.path().join("tracker.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = tokio::spawn(serve_once(listener, |req| {
            Response::error(&req.id, error_codes::TRACKER_NOT_RUNNING, "not running")
        }));

        let err = IpcClient::new(&socket)
            .send_request(Method::StopTracker, serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            RpcError::Remote { code, message } => {
                assert_eq!(code, error_codes::TRACKER_NOT_RUNNING);
                assert_eq!(message, "not running");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_closed() {
        let dir = tempdir().unwrap();
        let socket = dir.path().join("tracker.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
        });

        let err = IpcClient::new(&socket)
            .send_request(Method::StartTracker, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::ConnectionClosed));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = tempdir().unwrap();
        let socket = dir.path().join("tracker.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = IpcClient::new(&socket).with_timeout(Duration::from_millis(50));
        let err = client
            .send_request(Method::StopTracker, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Timeout(_)));
        assert_eq!(err.to_string(), "Request timed out after 50ms");
        server.abort();
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let dir = tempdir().unwrap();
        let client = IpcClient::new(dir.path().join("missing.sock"));
        let err = client
            .send_request(Method::StartTracker, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Socket(_)));
    }
}
