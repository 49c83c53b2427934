//! # Echo Bot Example
//!
//! Answers "ping" with "pong", whispers back to whispers, and waves at
//! everyone who joins.
//!
//! ```text
//! ROOMBOT_API_TOKEN=... ROOMBOT_ROOM_ID=... RUST_LOG=info cargo run -p echo-bot-demo
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use roombot_core::{
    action, filter, Bot, Client, ConnectionConfig, Event, EventContext, Filter, Handler,
    WebApiConnection,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Filters
// ============================================================================

/// Public chat message with exactly this text.
struct Said(&'static str);

#[async_trait]
impl Filter for Said {
    async fn check(&self, event: &Event, _ctx: &EventContext) -> Result<bool> {
        Ok(matches!(
            event,
            Event::ChatEvent { message, whisper: false, .. } if message.trim() == self.0
        ))
    }
}

fn is_whisper(event: &Event, _ctx: &EventContext) -> bool {
    matches!(event, Event::ChatEvent { whisper: true, .. })
}

// ============================================================================
// Handler tree
// ============================================================================

fn handlers() -> Handler {
    let root = Handler::named("echo-bot");

    root.child(Said("ping"))(action::from_async(|_event, ctx: EventContext| async move {
        ctx.client().chat("pong").await?;
        Ok::<_, anyhow::Error>(())
    }));

    root.child(filter::from_fn(is_whisper))(action::from_async(
        |event: Event, ctx: EventContext| async move {
            if let Event::ChatEvent { user, message, .. } = event {
                ctx.client()
                    .whisper(user.id, format!("you said: {message}"))
                    .await?;
            }
            Ok::<_, anyhow::Error>(())
        },
    ));

    root.child(filter::kind("UserJoinedEvent"))(action::from_async(
        |event: Event, ctx: EventContext| async move {
            if let Some(user) = event.user() {
                info!(username = %user.username, "user joined");
                ctx.client()
                    .emote("emote-hello", Some(user.id.clone()))
                    .await?;
            }
            Ok::<_, anyhow::Error>(())
        },
    ));

    root
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();

    let config = ConnectionConfig::from_env()?;
    info!(room_id = %config.room_id, "starting echo bot");

    let client = Arc::new(Client::new(Arc::new(WebApiConnection::new(config))));
    let bot = Bot::new(Arc::clone(&client), handlers());

    tokio::select! {
        result = bot.start() => {
            if let Err(e) = result {
                warn!(error = %e, "bot stopped");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }

    client.close().await?;
    Ok(())
}
