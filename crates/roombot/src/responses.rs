//! Responses to correlated requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::objects::{Conversation, CurrencyItem, Item, Message, PurchaseResult, User, UserPosition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Response {
    /// The server rejected the request.
    Error { message: String },

    #[serde(rename = "ChannelResponse")]
    Channel,

    #[serde(rename = "EmoteResponse")]
    Emote,

    #[serde(rename = "ReactionResponse")]
    Reaction,

    #[serde(rename = "KeepaliveResponse")]
    Keepalive,

    #[serde(rename = "TeleportResponse")]
    Teleport,

    #[serde(rename = "FloorHitResponse")]
    FloorHit,

    #[serde(rename = "AnchorHitResponse")]
    AnchorHit,

    /// Users in the room with their positions.
    #[serde(rename = "GetRoomUsersResponse")]
    GetRoomUsers { content: Vec<(User, UserPosition)> },

    #[serde(rename = "GetWalletResponse")]
    GetWallet { content: Vec<CurrencyItem> },

    #[serde(rename = "ModerateRoomResponse")]
    ModerateRoom,

    #[serde(rename = "GetRoomPrivilegeResponse")]
    GetRoomPrivilege,

    #[serde(rename = "ChangeRoomPrivilegeResponse")]
    ChangeRoomPrivilege,

    #[serde(rename = "MoveUserToRoomResponse")]
    MoveUserToRoom,

    #[serde(rename = "CheckVoiceChatResponse")]
    CheckVoiceChat { seconds_left: u64 },

    #[serde(rename = "GetUserOutfitResponse")]
    GetUserOutfit { outfit: Vec<Item> },

    #[serde(rename = "GetMessagesResponse")]
    GetMessages { messages: Vec<Message> },

    #[serde(rename = "SendMessageResponse")]
    SendMessage,

    /// `not_joined` counts conversations left out of the list.
    #[serde(rename = "GetConversationsResponse")]
    GetConversations {
        conversations: Vec<Conversation>,
        not_joined: u32,
    },

    #[serde(rename = "LeaveConversationResponse")]
    LeaveConversation,

    #[serde(rename = "BuyVoiceTimeResponse")]
    BuyVoiceTime { result: PurchaseResult },

    #[serde(rename = "BuyRoomBoostResponse")]
    BuyRoomBoost { result: PurchaseResult },

    #[serde(rename = "TipUserResponse")]
    TipUser { result: PurchaseResult },

    #[serde(rename = "SetOutfitResponse")]
    SetOutfit,

    #[serde(rename = "GetInventoryResponse")]
    GetInventory { items: Vec<Item> },

    #[serde(rename = "BuyItemResponse")]
    BuyItem { result: PurchaseResult },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Error { .. } => "Error",
            Self::Channel => "ChannelResponse",
            Self::Emote => "EmoteResponse",
            Self::Reaction => "ReactionResponse",
            Self::Keepalive => "KeepaliveResponse",
            Self::Teleport => "TeleportResponse",
            Self::FloorHit => "FloorHitResponse",
            Self::AnchorHit => "AnchorHitResponse",
            Self::GetRoomUsers { .. } => "GetRoomUsersResponse",
            Self::GetWallet { .. } => "GetWalletResponse",
            Self::ModerateRoom => "ModerateRoomResponse",
            Self::GetRoomPrivilege => "GetRoomPrivilegeResponse",
            Self::ChangeRoomPrivilege => "ChangeRoomPrivilegeResponse",
            Self::MoveUserToRoom => "MoveUserToRoomResponse",
            Self::CheckVoiceChat { .. } => "CheckVoiceChatResponse",
            Self::GetUserOutfit { .. } => "GetUserOutfitResponse",
            Self::GetMessages { .. } => "GetMessagesResponse",
            Self::SendMessage => "SendMessageResponse",
            Self::GetConversations { .. } => "GetConversationsResponse",
            Self::LeaveConversation => "LeaveConversationResponse",
            Self::BuyVoiceTime { .. } => "BuyVoiceTimeResponse",
            Self::BuyRoomBoost { .. } => "BuyRoomBoostResponse",
            Self::TipUser { .. } => "TipUserResponse",
            Self::SetOutfit => "SetOutfitResponse",
            Self::GetInventory { .. } => "GetInventoryResponse",
            Self::BuyItem { .. } => "BuyItemResponse",
        }
    }

    /// Parse a correlated wire message. The echoed `rid` is ignored.
    pub fn from_value(message: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(message)
    }
}
