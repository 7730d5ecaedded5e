//! A minimal in-process WebSocket JSON-RPC server for exercising `Chain`
//! end-to-end, grounded on `examples/paritytech-subxt/rpcs/src/client/
//! mock_rpc_client.rs`'s method-handler shape - adapted from a pluggable
//! `RpcClientT` substitute to a real WebSocket listener, since this crate's
//! `Transport` speaks to a socket directly rather than through a swappable
//! client trait.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// A scripted JSON-RPC responder. `handler` is called with `(method, params)`
/// for every inbound request and returns the `result` value to send back.
pub struct MockServer {
    pub url: String,
}

impl MockServer {
    pub async fn start<H>(handler: H) -> Self
    where
        H: Fn(&str, &serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let ws = match tokio_tungstenite::accept_async(stream).await {
                        Ok(ws) => ws,
                        Err(_) => return,
                    };
                    let (mut write, mut read) = ws.split();
                    while let Some(Ok(msg)) = read.next().await {
                        let Message::Text(text) = msg else { continue };
                        let Ok(request) = serde_json::from_str::<serde_json::Value>(&text) else { continue };
                        let id = request["id"].as_u64().unwrap_or(0);
                        let method = request["method"].as_str().unwrap_or_default().to_owned();
                        let params = request["params"].clone();
                        let result = handler(&method, &params);
                        let response = serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result});
                        if write.send(Message::Text(response.to_string())).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        MockServer { url: format!("ws://{addr}") }
    }
}
