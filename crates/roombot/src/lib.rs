//! # Roombot
//!
//! A persistent room connection with request correlation, and a tree of
//! filter/action handlers that reacts to whatever the room pushes.
//!
//! ## Core Concepts
//!
//! Roombot separates **answers** from **events**:
//! - [`Response`] = Answers (correlated to a request by its `rid`)
//! - [`Event`] = Facts (pushed by the server, never tied to a request)
//!
//! Every inbound message is exactly one of the two. Answers wake the caller
//! that is waiting on them; everything else flows into the handler tree.
//!
//! ## Architecture
//!
//! ```text
//! Client.call(req)
//!     │
//!     ▼ send(payload, wait)
//! WebApiConnection ──► attach rid ──► Correlator.register ──► Transport
//!                                            ▲                    │
//!                                            │ rid matches        │
//!                                            │                    ▼
//!                                      listen() loop ◄──── inbound frame
//!                                            │
//!                                            ▼ no pending rid
//!                                    Bot.start() loop
//!                                            │
//!                                            ▼ Handler.run(event, ctx)
//!                         root ──► filter ──► action ──┬─► child A
//!                                                      └─► child B
//! ```
//!
//! ## Key Invariants
//!
//! 1. **One waiter per rid** - A correlation id never has two pending waiters
//! 2. **Events are facts** - Parsed once at the connection boundary, never mutated
//! 3. **Filters gate subtrees** - A rejected node runs neither its action nor any descendant
//! 4. **Siblings are independent** - One failing subtree never cancels another
//! 5. **One event in flight** - A pass completes before the next event is dispatched;
//!    frames read meanwhile still route answers, and events queue behind the pass
//!
//! ## Guarantees
//!
//! - **No timeouts**: A request whose answer never comes waits until `close()`,
//!   a reconnect, or the end of the inbound stream
//! - **No retries**: Requests are never retransmitted
//! - **Best-effort listen**: Unreadable and malformed frames are logged and skipped
//!
//! ## Example
//!
//! ```ignore
//! use roombot_core::{action, filter, Bot, Client, ConnectionConfig, Event, Handler, WebApiConnection};
//! use std::sync::Arc;
//!
//! let config = ConnectionConfig::from_env()?;
//! let client = Arc::new(Client::new(Arc::new(WebApiConnection::new(config))));
//!
//! let root = Handler::new();
//! root.child(filter::from_fn(|event, _| {
//!     matches!(event, Event::ChatEvent { message, .. } if message == "ping")
//! }))(action::from_async(|_event, ctx| async move {
//!     ctx.client().chat("pong").await?;
//!     Ok(())
//! }));
//!
//! Bot::new(client, root).start().await?;
//! ```

// Wire layer
mod config;
mod connection;
mod correlator;
mod error;
mod transport;

// Typed schema
mod events;
pub mod objects;
mod requests;
mod response_macro;
mod responses;

// Dispatch
pub mod action;
mod bot;
mod client;
mod context;
pub mod filter;
mod handler;

#[cfg(test)]
mod test_support;

// Dispatch scenario tests (test-only)
#[cfg(test)]
mod dispatch_tests;


// Re-export connection types
pub use config::{ConnectionConfig, API_TOKEN_HEADER, DEFAULT_URI, KEEPALIVE_INTERVAL, ROOM_ID_HEADER};
pub use connection::{ApiConnection, WebApiConnection, KEEPALIVE_REQUEST, TYPE_FIELD};
pub use correlator::{generate_rid, rid_of, Correlator, Waiter, RID_FIELD};
pub use transport::{Connector, Transport, WsConnector, WsTransport};

// Re-export schema types
pub use events::Event;
pub use requests::Request;
pub use responses::Response;

// Re-export dispatch types
pub use action::{Action, ActionFactory, IntoAction};
pub use bot::Bot;
pub use client::Client;
pub use context::EventContext;
pub use filter::{Filter, FilterFactory, IntoFilter};
pub use handler::Handler;

// Re-export error types
pub use error::{
    BotError, ClientError, ConfigError, ConnectionError, DispatchError, HandlerError,
    HandlerFailure, TransportError,
};

// Re-export commonly used external types
pub use async_trait::async_trait;
