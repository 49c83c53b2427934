//! Server-pushed events.
//!
//! Events are facts: produced only at the connection boundary, immutable once
//! parsed, and tagged on the wire by their `_type` field.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::objects::{Reaction, TipItem, User, UserPosition};

/// Every event kind the server can push to a bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Event {
    /// A chat message from `user`, possibly whispered to the bot.
    ChatEvent {
        user: User,
        message: String,
        whisper: bool,
    },

    EmoteEvent {
        user: User,
        emote_id: String,
        receiver: User,
    },

    ReactionEvent {
        user: User,
        reaction: Reaction,
        receiver: User,
    },

    UserJoinedEvent {
        user: User,
        position: UserPosition,
    },

    UserLeftEvent {
        user: User,
    },

    /// A hidden message between bots or client-side scripts.
    ChannelEvent {
        sender_id: String,
        msg: String,
        #[serde(default)]
        tags: Option<Vec<String>>,
    },

    /// `sender` tipped `receiver` in the current room.
    TipReactionEvent {
        sender: User,
        receiver: User,
        item: TipItem,
    },

    UserMovedEvent {
        user: User,
        position: UserPosition,
    },

    /// Voice chat status changed. `users` pairs each user with their voice
    /// status, which the server leaves untyped.
    VoiceEvent {
        users: Vec<(User, Value)>,
        seconds_left: u64,
    },

    /// The bot received a direct message.
    MessageEvent {
        user_id: String,
        conversation_id: String,
        is_new_conversation: bool,
    },
}

impl Event {
    /// Wire discriminator of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChatEvent { .. } => "ChatEvent",
            Self::EmoteEvent { .. } => "EmoteEvent",
            Self::ReactionEvent { .. } => "ReactionEvent",
            Self::UserJoinedEvent { .. } => "UserJoinedEvent",
            Self::UserLeftEvent { .. } => "UserLeftEvent",
            Self::ChannelEvent { .. } => "ChannelEvent",
            Self::TipReactionEvent { .. } => "TipReactionEvent",
            Self::UserMovedEvent { .. } => "UserMovedEvent",
            Self::VoiceEvent { .. } => "VoiceEvent",
            Self::MessageEvent { .. } => "MessageEvent",
        }
    }

    /// The user who caused the event, when there is a single one.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::ChatEvent { user, .. }
            | Self::EmoteEvent { user, .. }
            | Self::ReactionEvent { user, .. }
            | Self::UserJoinedEvent { user, .. }
            | Self::UserLeftEvent { user }
            | Self::UserMovedEvent { user, .. } => Some(user),
            Self::TipReactionEvent { sender, .. } => Some(sender),
            Self::ChannelEvent { .. } | Self::VoiceEvent { .. } | Self::MessageEvent { .. } => {
                None
            }
        }
    }

    /// Parse an inbound wire message.
    pub fn from_value(message: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(message)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
