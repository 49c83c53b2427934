//! Fixtures shared by the unit tests.

use std::sync::Arc;

use crate::client::Client;
use crate::config::ConnectionConfig;
use crate::connection::WebApiConnection;
use crate::context::EventContext;
use crate::events::Event;
use crate::objects::User;

pub(crate) fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("{id}-name"),
    }
}

pub(crate) fn chat(message: &str) -> Event {
    Event::ChatEvent {
        user: user("u1"),
        message: message.to_string(),
        whisper: false,
    }
}

/// Context over a client that is never connected.
pub(crate) fn context() -> EventContext {
    let connection = WebApiConnection::new(ConnectionConfig::new("token", "room"));
    EventContext::new(Arc::new(Client::new(Arc::new(connection))))
}
