//! The persistent bot connection.
//!
//! ```text
//! send(payload) ──► attach rid ──► register waiter ──► Transport::send
//!                                        ▲
//! Transport::recv ──► parse ──► rid pending? ──yes──┘
//!                                   │
//!                                   no ──► listen() yields event
//! ```
//!
//! A background task sends a keepalive every [`KEEPALIVE_INTERVAL`] for as
//! long as the connection is open.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, KEEPALIVE_INTERVAL};
use crate::correlator::{generate_rid, rid_of, Correlator, RID_FIELD};
use crate::error::ConnectionError;
use crate::transport::{Connector, Transport, WsConnector};

/// Wire field naming the message kind.
pub const TYPE_FIELD: &str = "_type";

/// Message kind of the periodic keepalive.
pub const KEEPALIVE_REQUEST: &str = "KeepaliveRequest";

/// Raw send/listen contract the client façade is built on.
#[async_trait]
pub trait ApiConnection: Send + Sync {
    /// Establish the transport, consume the session handshake and start the
    /// keepalive task.
    async fn connect(&self) -> Result<(), ConnectionError>;

    /// Stop the keepalive task and close the transport.
    async fn close(&self) -> Result<(), ConnectionError>;

    /// Send `payload` with a fresh correlation id.
    ///
    /// With `wait_for_response` the call suspends until the matching response
    /// arrives through [`listen`](Self::listen); otherwise it returns an empty
    /// object immediately.
    async fn send(&self, payload: Value, wait_for_response: bool)
        -> Result<Value, ConnectionError>;

    /// Inbound messages that did not resolve a pending request.
    ///
    /// Responses are routed while this stream is being polled, so something
    /// must be consuming it for `send(.., true)` to complete. When the
    /// stream ends, outstanding waiters fail with [`ConnectionError::Closed`].
    fn listen(&self) -> BoxStream<'_, Value>;
}

struct Shared {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    correlator: Correlator,
}

impl Shared {
    fn transport(&self) -> Result<Arc<dyn Transport>, ConnectionError> {
        self.transport
            .read()
            .clone()
            .ok_or(ConnectionError::NotConnected)
    }

    fn is_current(&self, transport: &Arc<dyn Transport>) -> bool {
        self.transport
            .read()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, transport))
    }

    async fn send(&self, mut payload: Value, wait: bool) -> Result<Value, ConnectionError> {
        if !payload.is_object() {
            return Err(ConnectionError::InvalidPayload(json_kind(&payload)));
        }
        let transport = self.transport()?;

        let rid = generate_rid();
        payload[RID_FIELD] = Value::String(rid.clone());
        let frame = serde_json::to_string(&payload)?;

        // Register before writing so a fast response always finds its waiter.
        let waiter = if wait {
            Some(self.correlator.register(&rid)?)
        } else {
            None
        };

        debug!(rid = %rid, kind = message_kind(&payload), wait, "sending request");
        transport.send(frame).await?;

        match waiter {
            Some(waiter) => waiter.wait().await,
            None => Ok(Value::Object(Map::new())),
        }
    }

    async fn next_event(&self) -> Option<Value> {
        loop {
            let transport = match self.transport() {
                Ok(transport) => transport,
                Err(_) => {
                    debug!("listen stopped: not connected");
                    return None;
                }
            };

            let text = match transport.recv().await {
                Some(Ok(text)) => text,
                Some(Err(e)) => {
                    warn!(error = %e, "skipping unreadable frame");
                    continue;
                }
                None => {
                    // A reconnect may already have swapped in a fresh transport
                    // whose waiters must survive.
                    if self.is_current(&transport) {
                        info!("transport closed, listen stream ending");
                        self.correlator.clear();
                    } else {
                        debug!("previous transport closed, listen stream ending");
                    }
                    return None;
                }
            };

            let message: Value = match serde_json::from_str(&text) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "skipping malformed frame");
                    continue;
                }
            };

            let Some(rid) = rid_of(&message).map(str::to_owned) else {
                return Some(message);
            };

            match self.correlator.resolve_pending(&rid, message) {
                Some(unmatched) => return Some(unmatched),
                None => debug!(rid = %rid, "resolved pending request"),
            }
        }
    }
}

/// WebSocket-backed [`ApiConnection`] with request correlation and keepalive.
pub struct WebApiConnection {
    shared: Arc<Shared>,
    keepalive: Mutex<Option<JoinHandle<()>>>,
}

impl WebApiConnection {
    /// Connection over the default WebSocket transport.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Connection over a custom transport.
    pub fn with_connector(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                connector,
                transport: RwLock::new(None),
                correlator: Correlator::new(),
            }),
            keepalive: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    pub fn is_connected(&self) -> bool {
        self.shared.transport.read().is_some()
    }

    /// Number of requests still awaiting their response.
    pub fn pending_requests(&self) -> usize {
        self.shared.correlator.len()
    }
}

#[async_trait]
impl ApiConnection for WebApiConnection {
    async fn connect(&self) -> Result<(), ConnectionError> {
        let shared = &self.shared;
        let transport = shared.connector.connect(&shared.config).await?;

        match transport.recv().await {
            Some(Ok(metadata)) => debug!(bytes = metadata.len(), "discarded session metadata"),
            Some(Err(e)) => return Err(ConnectionError::Handshake(e.to_string())),
            None => {
                return Err(ConnectionError::Handshake(
                    "closed before session metadata".to_string(),
                ))
            }
        }

        let previous = shared.transport.write().replace(transport);
        if let Some(previous) = previous {
            warn!("connect called on an open connection, closing previous transport");
            // Waiters registered on the old transport will never see a reply.
            shared.correlator.clear();
            if let Err(e) = previous.close().await {
                warn!(error = %e, "failed to close previous transport");
            }
        }

        let handle = tokio::spawn(keepalive(Arc::clone(shared)));
        if let Some(previous) = self.keepalive.lock().replace(handle) {
            previous.abort();
        }

        info!(uri = %shared.config.uri, room_id = %shared.config.room_id, "connected");
        Ok(())
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        let keepalive = self.keepalive.lock().take();
        if let Some(handle) = keepalive {
            handle.abort();
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(error = %e, "keepalive task panicked");
                }
            }
        }

        let transport = self.shared.transport.write().take();
        self.shared.correlator.clear();

        if let Some(transport) = transport {
            transport.close().await?;
            info!("connection closed");
        }
        Ok(())
    }

    async fn send(
        &self,
        payload: Value,
        wait_for_response: bool,
    ) -> Result<Value, ConnectionError> {
        self.shared.send(payload, wait_for_response).await
    }

    fn listen(&self) -> BoxStream<'_, Value> {
        stream::unfold(&*self.shared, |shared| async move {
            shared.next_event().await.map(|event| (event, shared))
        })
        .boxed()
    }
}

impl Drop for WebApiConnection {
    fn drop(&mut self) {
        if let Some(handle) = self.keepalive.get_mut().take() {
            handle.abort();
        }
    }
}

async fn keepalive(shared: Arc<Shared>) {
    loop {
        tokio::time::sleep(KEEPALIVE_INTERVAL).await;
        if let Err(e) = shared
            .send(json!({ TYPE_FIELD: KEEPALIVE_REQUEST }), false)
            .await
        {
            warn!(error = %e, "keepalive failed");
        }
    }
}

fn message_kind(message: &Value) -> &str {
    message
        .get(TYPE_FIELD)
        .and_then(Value::as_str)
        .unwrap_or("<untyped>")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
