//! In-memory request channel for tests.

use crate::{RequestChannel, RpcResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracker_protocol::Method;

/// Replays queued results in order and records every request.
///
/// Once the queue is empty each request yields `Value::Null`.
#[derive(Default)]
pub struct ScriptedChannel {
    replies: Mutex<VecDeque<RpcResult<serde_json::Value>>>,
    calls: Mutex<Vec<(Method, serde_json::Value)>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result.
    pub fn push_result(&self, result: serde_json::Value) {
        self.replies.lock().push_back(Ok(result));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: crate::RpcError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Requests seen so far.
    pub fn calls(&self) -> Vec<(Method, serde_json::Value)> {
        self.calls.lock().clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.calls.lock().iter().map(|(m, _)| *m).collect()
    }
}

#[async_trait]
impl RequestChannel for ScriptedChannel {
    async fn send_request(
        &self,
        method: Method,
        params: serde_json::Value,
    ) -> RpcResult<serde_json::Value> {
        self.calls.lock().push((method, params));
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(Ok(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RpcError;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let channel = ScriptedChannel::new();
        channel.push_result(serde_json::json!({ "ok": true }));
        channel.push_error(RpcError::ConnectionClosed);

        let first = channel
            .send_request(Method::StartTracker, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(first["ok"], true);

        let second = channel
            .send_request(Method::StopTracker, serde_json::json!({}))
            .await;
        assert!(matches!(second, Err(RpcError::ConnectionClosed)));

        let third = channel
            .send_request(Method::StopTracker, serde_json::json!({}))
            .await
            .unwrap();
        assert!(third.is_null());

        assert_eq!(
            channel.methods(),
            vec![Method::StartTracker, Method::StopTracker, Method::StopTracker]
        );
    }
}
