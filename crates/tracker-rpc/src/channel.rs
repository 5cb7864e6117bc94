use crate::RpcResult;
use async_trait::async_trait;
use tracker_protocol::Method;

/// A request/response channel to the tracker server.
#[async_trait]
pub trait RequestChannel: Send + Sync {
    /// Send `method` with `params` and return the result payload
    /// (`Value::Null` when the server returned none).
    async fn send_request(
        &self,
        method: Method,
        params: serde_json::Value,
    ) -> RpcResult<serde_json::Value>;
}
