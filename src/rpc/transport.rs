//! The reconnecting WebSocket JSON-RPC transport (component A).
//!
//! Grounded on the builder/background-task shape of `subxt-rpcs`'s
//! `reconnecting_rpc_client` (`backend/rpc/reconnecting_rpc_client/mod.rs`):
//! a builder configures timeouts/backoff and spawns a background task that
//! owns the live connection. Unlike that implementation - which wraps
//! `jsonrpsee`'s own `Client` and lets it own id-correlation - this crate
//! owns id correlation directly per spec §4.A/§5: a single task multiplexes
//! a raw `tokio-tungstenite` WebSocket, dispatching inbound frames to a
//! waiter map (by numeric `id`) or a subscription map (by server-assigned
//! `subscription` id).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::types::{InboundMessage, RpcRequest};
use crate::error::RpcError;

/// Base backoff delay before the first reconnect attempt.
const BACKOFF_BASE: Duration = Duration::from_millis(100);
/// Maximum backoff delay between reconnect attempts.
const BACKOFF_CAP: Duration = Duration::from_secs(30);
/// Default per-call soft deadline (§5).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Consecutive timeouts after which the socket is marked unhealthy (§5).
const UNHEALTHY_TIMEOUT_THRESHOLD: u32 = 3;

/// Connection lifecycle state, observable for diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Reconnecting,
    Closed,
}

type Waiter = oneshot::Sender<Result<Value, RpcError>>;
type SubSender = mpsc::UnboundedSender<Result<Value, RpcError>>;

struct Shared {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, Waiter>>,
    subscriptions: Mutex<HashMap<String, SubSender>>,
    status: Mutex<ConnectionStatus>,
    consecutive_timeouts: AtomicU32,
    reconnect_count: AtomicU64,
    reconnected: Notify,
}

enum Op {
    Send(WsMessage),
    /// Best-effort unsubscribe; failures are ignored.
    Unsubscribe { method: String, sub_id: String },
    Close,
}

/// A handle to the reconnecting WebSocket transport. Cheaply [`Clone`]-able;
/// every clone shares the same underlying connection and waiter state.
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
    op_tx: mpsc::UnboundedSender<Op>,
    request_timeout: Duration,
}

/// A live subscription. Implements [`futures::Stream`] over notification payloads.
pub struct Subscription {
    sub_id: String,
    method: String,
    unsub_method: String,
    rx: mpsc::UnboundedReceiver<Result<Value, RpcError>>,
    op_tx: mpsc::UnboundedSender<Op>,
}

impl Subscription {
    /// The server-assigned subscription id.
    pub fn id(&self) -> &str {
        &self.sub_id
    }

    /// Await the next notification. Returns `None` once the subscription ends
    /// (explicit unsubscribe, or socket loss - per §4.A, subscriptions are
    /// not auto-resumed).
    pub async fn next(&mut self) -> Option<Result<Value, RpcError>> {
        self.rx.recv().await
    }

    /// Explicitly unsubscribe.
    pub fn unsubscribe(self) {
        // Dropping runs the same best-effort unsubscribe logic.
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.op_tx.send(Op::Unsubscribe {
            method: self.unsub_method.clone(),
            sub_id: self.sub_id.clone(),
        });
        let _ = &self.method; // kept for debugging/log context
    }
}

impl Transport {
    /// Connect to `url`, spawning the writer/reader supervisor task.
    pub async fn connect(url: impl Into<String>) -> Result<Self, RpcError> {
        Self::connect_with_timeout(url, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// As [`Self::connect`], but with an explicit per-call timeout.
    pub async fn connect_with_timeout(
        url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, RpcError> {
        let url = url.into();
        let shared = Arc::new(Shared {
            next_id: AtomicU64::new(1),
            waiters: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
            status: Mutex::new(ConnectionStatus::Reconnecting),
            consecutive_timeouts: AtomicU32::new(0),
            reconnect_count: AtomicU64::new(0),
            reconnected: Notify::new(),
        });

        let (op_tx, op_rx) = mpsc::unbounded_channel();

        // First connection attempt happens inline so `connect()` fails fast
        // if the endpoint is unreachable at all, rather than retrying forever
        // in the background before the caller learns anything.
        let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| RpcError::ConnectionRefused(e.to_string()))?;
        *shared.status.lock().unwrap() = ConnectionStatus::Connected;

        tokio::spawn(supervise(url, ws_stream, op_rx, shared.clone()));

        Ok(Transport {
            shared,
            op_tx,
            request_timeout,
        })
    }

    /// Single request/response call (component A contract).
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.waiters.lock().unwrap().insert(id, tx);

        let req = RpcRequest::new(id, method, params);
        let text = serde_json::to_string(&req)
            .map_err(|e| RpcError::DecodeError(e.to_string()))?;

        if self.op_tx.send(Op::Send(WsMessage::Text(text))).is_err() {
            self.shared.waiters.lock().unwrap().remove(&id);
            return Err(RpcError::ConnectionClosed);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => {
                self.shared.consecutive_timeouts.store(0, Ordering::Relaxed);
                result
            }
            Ok(Err(_)) => Err(RpcError::ConnectionClosed),
            Err(_) => {
                self.shared.waiters.lock().unwrap().remove(&id);
                self.shared
                    .consecutive_timeouts
                    .fetch_add(1, Ordering::Relaxed);
                Err(RpcError::Timeout(self.request_timeout))
            }
        }
    }

    /// Convenience wrapper over [`Transport::call`] that deserializes the
    /// JSON result into a concrete type.
    pub async fn call_as<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let raw = self.call(method, params).await?;
        serde_json::from_value(raw).map_err(|e| RpcError::DecodeError(e.to_string()))
    }

    /// Pipelined batch of calls: dispatched concurrently, results returned in
    /// the same order the calls were made (§4.A ordering guarantee within a
    /// single caller task).
    pub async fn call_batch(
        &self,
        calls: Vec<(String, Value)>,
    ) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
        let futures = calls
            .into_iter()
            .map(|(method, params)| async move { self.call(&method, params).await });
        Ok(futures::future::join_all(futures).await)
    }

    /// Open a subscription: issues `method(params)` to obtain a subscription
    /// id, then routes subsequent notifications carrying that id to the
    /// returned [`Subscription`].
    pub async fn subscribe(
        &self,
        method: &str,
        params: Value,
        unsub_method: &str,
    ) -> Result<Subscription, RpcError> {
        let result = self.call(method, params).await?;
        let sub_id = match result {
            Value::String(s) => s,
            other => other.to_string(),
        };

        let (sub_tx, sub_rx) = mpsc::unbounded_channel();
        self.shared
            .subscriptions
            .lock().unwrap()
            .insert(sub_id.clone(), sub_tx);

        Ok(Subscription {
            sub_id,
            method: method.to_owned(),
            unsub_method: unsub_method.to_owned(),
            rx: sub_rx,
            op_tx: self.op_tx.clone(),
        })
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.lock().unwrap()
    }

    /// How many times the socket has successfully reconnected.
    pub fn reconnect_count(&self) -> u64 {
        self.shared.reconnect_count.load(Ordering::Relaxed)
    }

    /// Resolves once the transport has reconnected at least once more from now.
    pub async fn wait_for_reconnect(&self) {
        self.shared.reconnected.notified().await;
    }

    /// Whether three consecutive timeouts have marked the socket unhealthy (§5).
    pub fn is_unhealthy(&self) -> bool {
        self.shared.consecutive_timeouts.load(Ordering::Relaxed) >= UNHEALTHY_TIMEOUT_THRESHOLD
    }

    /// Gracefully close the transport. In-flight futures complete with
    /// [`RpcError::ConnectionClosed`].
    pub fn close(&self) {
        *self.shared.status.lock().unwrap() = ConnectionStatus::Closed;
        let _ = self.op_tx.send(Op::Close);
    }
}

async fn supervise(
    url: String,
    mut ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    mut op_rx: mpsc::UnboundedReceiver<Op>,
    shared: Arc<Shared>,
) {
    let mut first_iteration = true;

    'reconnect: loop {
        if !first_iteration {
            match reconnect_with_backoff(&url, &shared).await {
                Some(stream) => ws_stream = stream,
                None => break 'reconnect, // transport was closed during backoff
            }
        }
        first_iteration = false;

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                op = op_rx.recv() => {
                    match op {
                        None | Some(Op::Close) => {
                            let _ = write.close().await;
                            drain_waiters(&shared, RpcError::ConnectionClosed);
                            *shared.status.lock().unwrap() = ConnectionStatus::Closed;
                            return;
                        }
                        Some(Op::Send(msg)) => {
                            if write.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Some(Op::Unsubscribe { method, sub_id }) => {
                            shared.subscriptions.lock().unwrap().remove(&sub_id);
                            let params = serde_json::json!([sub_id]);
                            let text = serde_json::to_string(&RpcRequest::new(0, method, params))
                                .unwrap_or_default();
                            let _ = write.send(WsMessage::Text(text)).await;
                        }
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => dispatch_inbound(&text, &shared),
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            if let Ok(text) = String::from_utf8(bytes) {
                                dispatch_inbound(&text, &shared);
                            }
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(_)) | None => break,
                    }
                }
            }
        }

        // Connection lost (or a write failed): transition to reconnecting and
        // fail every in-flight *request* so callers can retry, per §4.A.
        // Subscriptions are intentionally dropped, not re-established.
        *shared.status.lock().unwrap() = ConnectionStatus::Reconnecting;
        drain_waiters(&shared, RpcError::Reconnected);
        shared.subscriptions.lock().unwrap().clear();

        if matches!(*shared.status.lock().unwrap(), ConnectionStatus::Closed) {
            return;
        }
    }
}

fn drain_waiters(shared: &Shared, err: RpcError) {
    let waiters: Vec<_> = shared.waiters.lock().unwrap().drain().collect();
    for (_, tx) in waiters {
        let _ = tx.send(Err(match &err {
            RpcError::Reconnected => RpcError::Reconnected,
            RpcError::ConnectionClosed => RpcError::ConnectionClosed,
            other => RpcError::DecodeError(other.to_string()),
        }));
    }
}

fn dispatch_inbound(text: &str, shared: &Shared) {
    let parsed: Result<InboundMessage, _> = serde_json::from_str(text);
    match parsed {
        Ok(InboundMessage::Response(resp)) => {
            if let Some(tx) = shared.waiters.lock().unwrap().remove(&resp.id) {
                let result = match (resp.result, resp.error) {
                    (Some(v), _) => Ok(v),
                    (None, Some(e)) => Err(RpcError::RpcError {
                        code: e.code,
                        message: e.message,
                        data: e.data,
                    }),
                    (None, None) => Ok(Value::Null),
                };
                let _ = tx.send(result);
            }
        }
        Ok(InboundMessage::Notification(note)) => {
            let subs = shared.subscriptions.lock().unwrap();
            if let Some(tx) = subs.get(&note.params.subscription) {
                let _ = tx.send(Ok(note.params.result));
            }
        }
        Err(e) => {
            tracing::debug!(target: "subtensor_client::rpc", error = %e, "failed to decode inbound frame");
        }
    }
}

async fn reconnect_with_backoff(
    url: &str,
    shared: &Arc<Shared>,
) -> Option<
    tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
> {
    let mut delay = BACKOFF_BASE;
    loop {
        if matches!(*shared.status.lock().unwrap(), ConnectionStatus::Closed) {
            return None;
        }

        tracing::debug!(target: "subtensor_client::rpc", %url, "attempting reconnect");
        match tokio_tungstenite::connect_async(url).await {
            Ok((stream, _)) => {
                *shared.status.lock().unwrap() = ConnectionStatus::Connected;
                shared.reconnect_count.fetch_add(1, Ordering::Relaxed);
                shared.reconnected.notify_waiters();
                tracing::debug!(target: "subtensor_client::rpc", %url, "reconnected");
                return Some(stream);
            }
            Err(e) => {
                tracing::debug!(target: "subtensor_client::rpc", error = %e, ?delay, "reconnect attempt failed");
                let jitter = Duration::from_millis(rand::random::<u64>() % 50);
                tokio::time::sleep(delay + jitter).await;
                delay = (delay * 2).min(BACKOFF_CAP);
            }
        }
    }
}
