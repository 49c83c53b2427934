//! Outbound requests.
//!
//! Each variant serializes to one wire object tagged by `_type`. The
//! correlation id is attached later by the connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::objects::{GoldBar, Item, MessageCategory, ModerationAction, PaymentMethod, Reaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Request {
    /// Broadcast a chat message, or whisper it to `whisper_target_id`.
    #[serde(rename = "ChatRequest")]
    Chat {
        message: String,
        whisper_target_id: Option<String>,
    },

    /// Hidden message for other bots and client-side scripts.
    #[serde(rename = "ChannelRequest")]
    Channel {
        message: String,
        tags: Option<Vec<String>>,
    },

    /// Perform an emote such as `emote-hello` or `dance-macarena`, optionally
    /// directed at a user.
    #[serde(rename = "EmoteRequest")]
    Emote {
        emote_id: String,
        target_user_id: Option<String>,
    },

    #[serde(rename = "ReactionRequest")]
    Reaction {
        reaction: Reaction,
        target_user_id: String,
    },

    /// Must be sent every 15 seconds or the server drops the session.
    #[serde(rename = "KeepaliveRequest")]
    Keepalive,

    #[serde(rename = "TeleportRequest")]
    Teleport { user_id: String },

    #[serde(rename = "FloorHitRequest")]
    FloorHit,

    #[serde(rename = "AnchorHitRequest")]
    AnchorHit,

    #[serde(rename = "GetRoomUsersRequest")]
    GetRoomUsers,

    #[serde(rename = "GetWalletRequest")]
    GetWallet,

    /// Kick, ban, unban or mute a user. `action_length` is in seconds.
    #[serde(rename = "ModerateRoomRequest")]
    ModerateRoom {
        user_id: String,
        moderation_action: ModerationAction,
        action_length: Option<u64>,
    },

    #[serde(rename = "GetRoomPrivilegeRequest")]
    GetRoomPrivilege { user_id: String },

    /// Bots act with their owner's privileges and must be in the room.
    #[serde(rename = "ChangeRoomPrivilegeRequest")]
    ChangeRoomPrivilege { user_id: String },

    #[serde(rename = "MoveUserToRoomRequest")]
    MoveUserToRoom { user_id: String, room_id: String },

    #[serde(rename = "InviteSpeakerRequest")]
    InviteSpeaker { user_id: String },

    #[serde(rename = "RemoveSpeakerRequest")]
    RemoveSpeaker { user_id: String },

    #[serde(rename = "CheckVoiceChatRequest")]
    CheckVoiceChat,

    #[serde(rename = "GetUserOutfitRequest")]
    GetUserOutfit { user_id: String },

    #[serde(rename = "GetBackpackRequest")]
    GetBackpack { user_id: String },

    /// At most 20 messages; page with `last_message_id`.
    #[serde(rename = "GetMessagesRequest")]
    GetMessages {
        conversation_id: String,
        last_message_id: Option<String>,
    },

    /// `room_id` is required for invites.
    #[serde(rename = "SendMessageRequest")]
    SendMessage {
        conversation_id: String,
        content: String,
        #[serde(rename = "type")]
        message_type: MessageCategory,
        room_id: Option<String>,
    },

    /// At most 20 conversations; page with `last_id`.
    #[serde(rename = "GetConversationsRequest")]
    GetConversations {
        not_joined: Option<bool>,
        last_id: Option<String>,
    },

    #[serde(rename = "LeaveConversationRequest")]
    LeaveConversation { conversation_id: String },

    #[serde(rename = "BuyVoiceTimeRequest")]
    BuyVoiceTime { payment_method: PaymentMethod },

    #[serde(rename = "BuyRoomBoostRequest")]
    BuyRoomBoost {
        payment_method: PaymentMethod,
        amount: Option<u32>,
    },

    #[serde(rename = "TipUserRequest")]
    TipUser { user_id: String, gold_bar: GoldBar },

    #[serde(rename = "SetOutfitRequest")]
    SetOutfit { outfit: Vec<Item> },

    #[serde(rename = "GetInventoryRequest")]
    GetInventory,

    #[serde(rename = "BuyItemRequest")]
    BuyItem { item_id: String },
}

impl Request {
    /// Whether the server answers this request.
    ///
    /// Chat, speaker management and backpack requests are fire-and-forget.
    pub fn expects_response(&self) -> bool {
        !matches!(
            self,
            Self::Chat { .. }
                | Self::InviteSpeaker { .. }
                | Self::RemoveSpeaker { .. }
                | Self::GetBackpack { .. }
        )
    }

    /// Wire discriminator of this request.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "ChatRequest",
            Self::Channel { .. } => "ChannelRequest",
            Self::Emote { .. } => "EmoteRequest",
            Self::Reaction { .. } => "ReactionRequest",
            Self::Keepalive => "KeepaliveRequest",
            Self::Teleport { .. } => "TeleportRequest",
            Self::FloorHit => "FloorHitRequest",
            Self::AnchorHit => "AnchorHitRequest",
            Self::GetRoomUsers => "GetRoomUsersRequest",
            Self::GetWallet => "GetWalletRequest",
            Self::ModerateRoom { .. } => "ModerateRoomRequest",
            Self::GetRoomPrivilege { .. } => "GetRoomPrivilegeRequest",
            Self::ChangeRoomPrivilege { .. } => "ChangeRoomPrivilegeRequest",
            Self::MoveUserToRoom { .. } => "MoveUserToRoomRequest",
            Self::InviteSpeaker { .. } => "InviteSpeakerRequest",
            Self::RemoveSpeaker { .. } => "RemoveSpeakerRequest",
            Self::CheckVoiceChat => "CheckVoiceChatRequest",
            Self::GetUserOutfit { .. } => "GetUserOutfitRequest",
            Self::GetBackpack { .. } => "GetBackpackRequest",
            Self::GetMessages { .. } => "GetMessagesRequest",
            Self::SendMessage { .. } => "SendMessageRequest",
            Self::GetConversations { .. } => "GetConversationsRequest",
            Self::LeaveConversation { .. } => "LeaveConversationRequest",
            Self::BuyVoiceTime { .. } => "BuyVoiceTimeRequest",
            Self::BuyRoomBoost { .. } => "BuyRoomBoostRequest",
            Self::TipUser { .. } => "TipUserRequest",
            Self::SetOutfit { .. } => "SetOutfitRequest",
            Self::GetInventory => "GetInventoryRequest",
            Self::BuyItem { .. } => "BuyItemRequest",
        }
    }

    /// Wire object for this request, without a correlation id.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
