//! Wire-level JSON-RPC v2 shapes (component A, §3 "RPC Request"/"RPC Response"/"Subscription").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outbound JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        RpcRequest {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// An inbound message: either a correlated response, or a subscription notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Response(RpcResponse),
    Notification(RpcNotification),
}

/// A response correlated to a request by numeric `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// A subscription notification, correlated by the server-assigned `subscription` id.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcNotification {
    pub method: String,
    pub params: NotificationParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    pub subscription: String,
    pub result: Value,
}
