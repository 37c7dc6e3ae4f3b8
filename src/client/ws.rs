//! JSON-RPC over WebSocket
//!
//! One writer task drains an outgoing queue into the socket sink. One reader
//! task routes responses to pending requests by id and notifications to
//! subscriptions by subscription id.

use super::transport::{Connection, NotificationStream, SocketTransport};
use crate::config::TransferConfig;
use crate::error::{TransferError, TransferResult};
use crate::{log_debug, log_info, log_warn};
use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Notifications kept for a subscription id not registered yet
const MAX_ORPHANS_PER_SUBSCRIPTION: usize = 16;
/// Unregistered subscription ids buffered at once
const MAX_ORPHAN_SUBSCRIPTIONS: usize = 64;
/// Released subscription ids whose late notifications are dropped
const MAX_RELEASED_SUBSCRIPTIONS: usize = 256;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket connection failed: {0}")]
    Connect(String),
    #[error("Connect timeout after {0} ms")]
    Timeout(u64),
    #[error("Connection closed")]
    Closed,
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        WsError::Connect(e.to_string())
    }
}

impl From<WsError> for TransferError {
    fn from(e: WsError) -> Self {
        match e {
            WsError::Rpc { .. } | WsError::InvalidResponse(_) => {
                TransferError::query_failed(e.to_string())
            }
            _ => TransferError::connection(e.to_string()),
        }
    }
}

type PendingMap = HashMap<u64, oneshot::Sender<Result<Value, WsError>>>;

#[derive(Default)]
struct SubscriptionTable {
    senders: HashMap<String, fmpsc::UnboundedSender<Value>>,
    orphans: HashMap<String, Vec<Value>>,
    released: VecDeque<String>,
}

impl SubscriptionTable {
    fn buffer_orphan(&mut self, sub_id: String, value: Value) {
        if self.released.contains(&sub_id) {
            return;
        }
        if !self.orphans.contains_key(&sub_id) && self.orphans.len() >= MAX_ORPHAN_SUBSCRIPTIONS {
            return;
        }
        let buffered = self.orphans.entry(sub_id).or_default();
        if buffered.len() < MAX_ORPHANS_PER_SUBSCRIPTION {
            buffered.push(value);
        }
    }

    fn release(&mut self, sub_id: &str) {
        self.senders.remove(sub_id);
        self.orphans.remove(sub_id);
        if self.released.len() >= MAX_RELEASED_SUBSCRIPTIONS {
            self.released.pop_front();
        }
        self.released.push_back(sub_id.to_string());
    }
}

struct Inner {
    endpoint: String,
    next_id: AtomicU64,
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Mutex<PendingMap>,
    subscriptions: Mutex<SubscriptionTable>,
}

impl Inner {
    fn send_request(&self, method: &str, params: Value) -> Result<oneshot::Receiver<Result<Value, WsError>>, WsError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        self.pending
            .lock()
            .map_err(|_| WsError::Closed)?
            .insert(id, tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        if self.outgoing.send(Message::Text(payload.to_string())).is_err() {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&id);
            }
            return Err(WsError::Closed);
        }
        Ok(rx)
    }

    fn route(&self, text: &str) {
        let message: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                log_warn!("ws", "Dropping unparsable frame", error = e);
                return;
            }
        };

        if let Some(id) = message.get("id").and_then(Value::as_u64) {
            let waiter = self.pending.lock().ok().and_then(|mut p| p.remove(&id));
            if let Some(waiter) = waiter {
                let _ = waiter.send(parse_response(&message));
            }
            return;
        }

        let Some(params) = message.get("params") else {
            return;
        };
        let Some(sub_id) = params.get("subscription").and_then(subscription_key) else {
            return;
        };
        let result = params.get("result").cloned().unwrap_or(Value::Null);

        if let Ok(mut table) = self.subscriptions.lock() {
            match table.senders.get(&sub_id) {
                Some(sender) => {
                    let _ = sender.unbounded_send(result);
                }
                None => table.buffer_orphan(sub_id, result),
            }
        }
    }

    fn close(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            for (_, waiter) in pending.drain() {
                let _ = waiter.send(Err(WsError::Closed));
            }
        }
        if let Ok(mut table) = self.subscriptions.lock() {
            table.senders.clear();
            table.orphans.clear();
            table.released.clear();
        }
    }
}

fn subscription_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_response(message: &Value) -> Result<Value, WsError> {
    if let Some(error) = message.get("error") {
        return Err(WsError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    message
        .get("result")
        .cloned()
        .ok_or_else(|| WsError::InvalidResponse("missing result".to_string()))
}

/// Live WebSocket connection to one endpoint
pub struct WsConnection {
    inner: Arc<Inner>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsConnection {
    fn spawn<S>(stream: S, endpoint: &str) -> Self
    where
        S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Send
            + Unpin
            + 'static,
    {
        let (mut sink, mut source) = stream.split();
        let (outgoing, mut queue) = mpsc::unbounded_channel::<Message>();

        let inner = Arc::new(Inner {
            endpoint: endpoint.to_string(),
            next_id: AtomicU64::new(1),
            outgoing,
            pending: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(SubscriptionTable::default()),
        });

        let writer = tokio::spawn(async move {
            while let Some(message) = queue.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        let reader_inner = inner.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => reader_inner.route(&text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        log_warn!("ws", "Socket read failed", endpoint = reader_inner.endpoint, error = e);
                        break;
                    }
                }
            }
            log_debug!("ws", "Socket closed", endpoint = reader_inner.endpoint);
            reader_inner.close();
        });

        Self {
            inner,
            reader,
            writer,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn request(&self, method: &str, params: Value) -> TransferResult<Value> {
        let rx = self.inner.send_request(method, params)?;
        let response = rx.await.map_err(|_| WsError::Closed)?;
        Ok(response?)
    }

    async fn subscribe(
        &self,
        method: &str,
        params: Value,
        unsubscribe_method: &str,
    ) -> TransferResult<NotificationStream> {
        let sub_id = self.request(method, params).await?;
        let sub_id = subscription_key(&sub_id).ok_or_else(|| {
            TransferError::from(WsError::InvalidResponse(format!(
                "{} returned no subscription id",
                method
            )))
        })?;

        let (tx, rx) = fmpsc::unbounded();
        {
            let mut table = self
                .inner
                .subscriptions
                .lock()
                .map_err(|_| TransferError::from(WsError::Closed))?;
            for early in table.orphans.remove(&sub_id).unwrap_or_default() {
                let _ = tx.unbounded_send(early);
            }
            table.senders.insert(sub_id.clone(), tx);
        }

        Ok(Box::pin(SubscriptionStream {
            receiver: rx,
            inner: self.inner.clone(),
            sub_id,
            unsubscribe_method: unsubscribe_method.to_string(),
        }))
    }
}

/// Notification stream that unsubscribes when dropped
struct SubscriptionStream {
    receiver: fmpsc::UnboundedReceiver<Value>,
    inner: Arc<Inner>,
    sub_id: String,
    unsubscribe_method: String,
}

impl Stream for SubscriptionStream {
    type Item = TransferResult<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx).map(|item| item.map(Ok))
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        if let Ok(mut table) = self.inner.subscriptions.lock() {
            table.release(&self.sub_id);
        }
        // fire and forget; the response is never awaited
        let _ = self
            .inner
            .send_request(&self.unsubscribe_method, json!([self.sub_id]));
    }
}

/// Socket transport over `tokio-tungstenite`
#[derive(Debug, Clone)]
pub struct WsTransport {
    connect_timeout: Duration,
}

impl WsTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }


    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.connect_timeout())
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::from_config(&TransferConfig::default())
    }
}

#[async_trait]
impl SocketTransport for WsTransport {
    async fn connect(&self, endpoints: &[String]) -> TransferResult<Arc<dyn Connection>> {
        let mut last_error = None;

        for endpoint in endpoints {
            match tokio::time::timeout(self.connect_timeout, connect_async(endpoint.as_str())).await {
                Ok(Ok((stream, _response))) => {
                    log_info!("ws", "Connected", endpoint = endpoint);
                    return Ok(Arc::new(WsConnection::spawn(stream, endpoint)));
                }
                Ok(Err(e)) => {
                    log_warn!("ws", "Endpoint failed", endpoint = endpoint, error = e);
                    last_error = Some(WsError::from(e));
                }
                Err(_) => {
                    log_warn!("ws", "Endpoint timed out", endpoint = endpoint);
                    last_error = Some(WsError::Timeout(self.connect_timeout.as_millis() as u64));
                }
            }
        }

        Err(match last_error {
            Some(e) => TransferError::from(e),
            None => TransferError::connection("No endpoints configured"),
        })
    }
}
