//! Error types for each layer of the bot stack.
//!
//! Lower layers recover transient transport hiccups locally (the listen loop
//! skips them). Everything else surfaces to the immediate caller through one
//! of these types.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) or
/// [`Connector`](crate::Connector).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URI or one of the metadata headers could not be turned
    /// into a handshake request.
    #[error("invalid connection request: {0}")]
    InvalidRequest(String),

    /// The transport could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// A frame could not be written.
    #[error("send failed: {0}")]
    Send(String),

    /// A frame could not be read.
    #[error("receive failed: {0}")]
    Receive(String),

    /// Tearing down the transport failed.
    #[error("close failed: {0}")]
    Close(String),
}

/// Errors raised by the wire connection and its correlator.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// `send`/`listen` was called before `connect` (or after `close`).
    #[error("connection is not established")]
    NotConnected,

    /// The session handshake frame never arrived.
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Outbound payloads must be JSON objects so the correlation id can be
    /// attached.
    #[error("payload must be a JSON object, got {0}")]
    InvalidPayload(&'static str),

    /// A waiter is already registered under this correlation id.
    #[error("correlation id {0} already has a pending waiter")]
    DuplicateRid(String),

    /// A pending request was abandoned because the connection was torn down.
    #[error("connection closed while awaiting response")]
    Closed,
}

/// Errors raised by the typed client façade.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered the request with an `Error` frame.
    #[error("server rejected request: {message}")]
    Server { message: String },

    /// The request is fire-and-forget; the server never answers it.
    #[error("{0} has no response")]
    NoResponse(&'static str),

    #[error("expected {expected}, got {got}")]
    UnexpectedResponse {
        expected: &'static str,
        got: String,
    },
}

/// Errors raised while assembling a handler tree.
///
/// These abort construction; a misconfigured tree is never silently accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler {0} is already attached to a parent")]
    AlreadyAttached(String),

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: String, child: String },
}

/// A single filter or action failure inside a dispatch pass.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    #[error("filter at {path} failed: {source}")]
    Filter {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("action at {path} failed: {source}")]
    Action {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl HandlerFailure {
    /// Path of the handler node that failed.
    pub fn path(&self) -> &str {
        match self {
            Self::Filter { path, .. } | Self::Action { path, .. } => path,
        }
    }
}

/// Aggregate of every failure collected during one dispatch pass.
///
/// Sibling subtrees always run to completion; their failures are gathered
/// here rather than cancelling each other.
#[derive(Debug, Error)]
#[error("{} handler(s) failed during dispatch", failures.len())]
pub struct DispatchError {
    pub failures: Vec<HandlerFailure>,
}

/// Errors that stop the bot driver loop.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Configuration could not be loaded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
}
