use std::sync::Arc;

use crate::client::Client;

/// Shared state handed to every filter and action during one dispatch pass.
///
/// Built fresh for each inbound event and dropped once the pass completes.
#[derive(Clone)]
pub struct EventContext {
    client: Arc<Client>,
}

impl EventContext {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Client for replying to the room.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
