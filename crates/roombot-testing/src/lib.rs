//! Testing utilities for roombot.
//!
//! [`ScriptedConnector`] hands out an in-memory [`ScriptedTransport`] so a
//! [`WebApiConnection`](roombot_core::WebApiConnection) can be driven without
//! a network: tests push inbound frames, inspect what was sent, and end the
//! stream when they are done. [`Recorder`] is an action that keeps every
//! event it sees.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use roombot_core::{
    Action, ConnectionConfig, Connector, Event, EventContext, Transport, TransportError,
    RID_FIELD, TYPE_FIELD,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};

type Inbound = Result<String, TransportError>;

/// Config pointing at a host that is never contacted.
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::new("test-token", "test-room").with_uri("ws://scripted.invalid/botapi")
}

/// Session metadata frame the server sends right after connecting.
pub fn handshake_frame() -> Value {
    json!({
        "user_id": "bot-user",
        "room_info": { "owner_id": "owner", "room_name": "Test Room" },
        "connection_id": "conn-1",
    })
}

pub fn user(id: &str) -> Value {
    json!({ "id": id, "username": format!("{id}-name") })
}

pub fn chat_event(user_id: &str, message: &str) -> Value {
    json!({
        "_type": "ChatEvent",
        "user": user(user_id),
        "message": message,
        "whisper": false,
    })
}

// ============================================================================
// Transport
// ============================================================================

/// In-memory transport fed by the test.
pub struct ScriptedTransport {
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<Inbound>>>,
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Inbound>>,
    sent: Mutex<Vec<String>>,
    sent_notify: Notify,
    echo: AtomicBool,
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx: Mutex::new(Some(tx)),
            inbound_rx: tokio::sync::Mutex::new(rx),
            sent: Mutex::new(Vec::new()),
            sent_notify: Notify::new(),
            echo: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Reflect every sent frame back as an inbound frame.
    pub fn set_echo(&self, echo: bool) {
        self.echo.store(echo, Ordering::SeqCst);
    }

    /// Make every following send fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Queue an inbound JSON message.
    pub fn push(&self, message: Value) {
        self.push_raw(message.to_string());
    }

    /// Queue an inbound frame verbatim, even if it is not valid JSON.
    pub fn push_raw(&self, frame: impl Into<String>) {
        self.enqueue(Ok(frame.into()));
    }

    /// Queue a read failure.
    pub fn push_error(&self, reason: impl Into<String>) {
        self.enqueue(Err(TransportError::Receive(reason.into())));
    }

    /// Answer a request, echoing its correlation id.
    pub fn respond(&self, request: &Value, mut response: Value) {
        response[RID_FIELD] = request[RID_FIELD].clone();
        self.push(response);
    }

    /// End the inbound stream once queued frames are drained.
    pub fn end(&self) {
        self.inbound_tx.lock().take();
    }

    fn enqueue(&self, frame: Inbound) {
        if let Some(tx) = self.inbound_tx.lock().as_ref() {
            // Receiver lives as long as the transport.
            let _ = tx.send(frame);
        }
    }

    /// Every frame sent so far, parsed.
    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }

    /// Sent frames whose `_type` is `kind`.
    pub fn sent_of_kind(&self, kind: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|frame| frame.get(TYPE_FIELD).and_then(Value::as_str) == Some(kind))
            .collect()
    }

    /// Wait until at least `count` frames have been sent.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<Value> {
        loop {
            let notified = self.sent_notify.notified();
            if self.sent.lock().len() >= count {
                return self.sent();
            }
            notified.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, frame: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Send("transport closed".to_string()));
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("scripted send failure".to_string()));
        }
        if self.echo.load(Ordering::SeqCst) {
            self.push_raw(frame.clone());
        }
        self.sent.lock().push(frame);
        self.sent_notify.notify_waiters();
        Ok(())
    }

    async fn recv(&self) -> Option<Result<String, TransportError>> {
        self.inbound_rx.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        self.end();
        Ok(())
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Connector handing out scripted transports.
///
/// The first connect gets [`transport`](Self::transport), whose handshake
/// frame is queued when the connector is built so frames pushed before
/// `connect` still arrive after it. Reconnects take the transports queued
/// with [`then_transport`](Self::then_transport), falling back to the first
/// one (without a new handshake) once the queue is empty.
pub struct ScriptedConnector {
    transport: Arc<ScriptedTransport>,
    reconnects: Mutex<VecDeque<Arc<ScriptedTransport>>>,
    failure: Option<String>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        let connector = Self::without_handshake();
        connector.transport.push(handshake_frame());
        connector
    }

    /// No handshake frame; the test scripts the first frame itself.
    pub fn without_handshake() -> Self {
        Self {
            transport: Arc::new(ScriptedTransport::new()),
            reconnects: Mutex::new(VecDeque::new()),
            failure: None,
            connects: AtomicUsize::new(0),
        }
    }

    /// Echo every sent frame back to the connection.
    pub fn echoing() -> Self {
        let connector = Self::new();
        connector.transport.set_echo(true);
        connector
    }

    /// Refuse every connection attempt.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::without_handshake()
        }
    }

    pub fn transport(&self) -> Arc<ScriptedTransport> {
        Arc::clone(&self.transport)
    }

    /// Queue a fresh transport, handshake included, for the next reconnect.
    pub fn then_transport(&self) -> Arc<ScriptedTransport> {
        let next = Arc::new(ScriptedTransport::new());
        next.push(handshake_frame());
        self.reconnects.lock().push_back(Arc::clone(&next));
        next
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(TransportError::Connect(format!("{}: {reason}", config.uri)));
        }
        let next = if attempt > 0 {
            self.reconnects.lock().pop_front()
        } else {
            None
        };
        let transport: Arc<dyn Transport> = next.unwrap_or_else(|| Arc::clone(&self.transport));
        Ok(transport)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Action that records every event it runs for.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(Event::kind).collect()
    }
}

#[async_trait]
impl Action for Recorder {
    async fn run(&self, event: &Event, _ctx: &EventContext) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
