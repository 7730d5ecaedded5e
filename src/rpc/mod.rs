//! Component A: the reconnecting WebSocket JSON-RPC transport.

mod transport;
mod types;

pub use transport::{ConnectionStatus, Subscription, Transport};
pub use types::{InboundMessage, NotificationParams, RpcErrorObject, RpcNotification, RpcRequest, RpcResponse};
