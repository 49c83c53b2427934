use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::client::Client;
use crate::context::EventContext;
use crate::error::{BotError, ConnectionError};
use crate::events::Event;
use crate::handler::Handler;

/// Drives events from a [`Client`] through a handler tree.
pub struct Bot {
    client: Arc<Client>,
    handler: Handler,
}

impl Bot {
    pub fn new(client: Arc<Client>, handler: Handler) -> Self {
        Self { client, handler }
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Root of the handler tree. Nodes may still be added after start.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Connect, then dispatch every event in arrival order.
    ///
    /// Each event is fully dispatched before the next one starts. The event
    /// stream keeps being read during a pass, so actions can await correlated
    /// responses; events that arrive meanwhile are queued. Never returns `Ok`:
    /// the loop stops with [`ConnectionError::Closed`] once the stream has
    /// ended and the queue is drained, or with the first failing dispatch
    /// pass. The connection is left open on failure.
    pub async fn start(&self) -> Result<(), BotError> {
        self.client.connect().await?;
        info!("bot started");

        let mut events = self.client.listen();
        let mut backlog: VecDeque<Event> = VecDeque::new();
        let mut stream_open = true;

        loop {
            let event = match backlog.pop_front() {
                Some(event) => event,
                None if stream_open => match events.next().await {
                    Some(event) => event,
                    None => break,
                },
                None => break,
            };

            debug!(kind = event.kind(), queued = backlog.len(), "dispatching event");
            let ctx = EventContext::new(Arc::clone(&self.client));
            let mut dispatch = self.handler.run(&event, &ctx);

            let result = loop {
                tokio::select! {
                    result = &mut dispatch => break result,
                    next = events.next(), if stream_open => match next {
                        Some(event) => backlog.push_back(event),
                        None => stream_open = false,
                    },
                }
            };

            if let Err(e) = result {
                for failure in &e.failures {
                    error!(path = failure.path(), error = %failure, "handler failed");
                }
                return Err(e.into());
            }
        }

        info!("event stream ended");
        Err(ConnectionError::Closed.into())
    }
}
