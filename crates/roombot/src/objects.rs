//! Records shared by events, requests and responses.

use serde::{Deserialize, Serialize};

/// A room user. Usernames can change; ids never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    FrontRight,
    FrontLeft,
    BackRight,
    BackLeft,
}

/// A point on the room floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Facing>,
}

/// A seat or other anchor on a piece of furniture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPosition {
    pub entity_id: String,
    pub anchor_ix: u32,
}

/// Where a user stands: on the floor or on an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserPosition {
    Floor(Position),
    Anchor(AnchorPosition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Clothing,
    Collectible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub amount: u64,
    pub id: String,
    pub account_bound: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_palette: Option<i64>,
}

/// An amount of a currency such as `gold` or `bubbles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyItem {
    #[serde(rename = "type")]
    pub currency: String,
    pub amount: u64,
}

/// What a tip carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TipItem {
    Item(Item),
    Currency(CurrencyItem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Clap,
    Heart,
    Thumbs,
    Wave,
    Wink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Text,
    Invite,
}

/// A direct message inside a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub conversation_id: String,
    pub content: String,
    pub sender_id: String,
    pub category: MessageCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub did_join: bool,
    pub unread_count: u32,
    pub muted: bool,
    #[serde(default)]
    pub member_ids: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Kick,
    Ban,
    Unban,
    Mute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BotWalletOnly,
    BotWalletPriority,
    UserWalletOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoldBar {
    #[serde(rename = "gold_bar_1")]
    One,
    #[serde(rename = "gold_bar_5")]
    Five,
    #[serde(rename = "gold_bar_10")]
    Ten,
    #[serde(rename = "gold_bar_50")]
    Fifty,
    #[serde(rename = "gold_bar_100")]
    Hundred,
    #[serde(rename = "gold_bar_500")]
    FiveHundred,
    #[serde(rename = "gold_bar_1k")]
    Thousand,
    #[serde(rename = "gold_bar_5000")]
    FiveThousand,
    #[serde(rename = "gold_bar_10k")]
    TenThousand,
}

/// Outcome of a purchase or tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseResult {
    Success,
    InsufficientFunds,
    OnlyTokenBought,
}
