//! Typed façade over an [`ApiConnection`].
//!
//! Every method builds one [`Request`], hands it to the connection and, when
//! the server answers, checks that the answer is the expected [`Response`]
//! variant.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, warn};

use crate::connection::{ApiConnection, TYPE_FIELD};
use crate::correlator::rid_of;
use crate::error::{ClientError, ConnectionError};
use crate::events::Event;
use crate::objects::{
    Conversation, CurrencyItem, GoldBar, Item, Message, MessageCategory, ModerationAction,
    PaymentMethod, PurchaseResult, Reaction, User, UserPosition,
};
use crate::requests::Request;
use crate::response_macro::expect_response;
use crate::responses::Response;

pub struct Client {
    connection: Arc<dyn ApiConnection>,
}

impl Client {
    pub fn new(connection: Arc<dyn ApiConnection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<dyn ApiConnection> {
        &self.connection
    }

    pub async fn connect(&self) -> Result<(), ConnectionError> {
        self.connection.connect().await
    }

    pub async fn close(&self) -> Result<(), ConnectionError> {
        self.connection.close().await
    }

    /// Typed events from the room.
    ///
    /// Messages that are not a known event are logged and skipped.
    pub fn listen(&self) -> BoxStream<'_, Event> {
        self.connection
            .listen()
            .filter_map(|message| async move {
                let kind = message
                    .get(TYPE_FIELD)
                    .and_then(|v| v.as_str())
                    .unwrap_or("<untyped>")
                    .to_string();
                let late_response = rid_of(&message).is_some();

                match Event::from_value(message) {
                    Ok(event) => Some(event),
                    // Answers to fire-and-forget requests land here.
                    Err(_) if late_response => {
                        debug!(kind = %kind, "dropping uncorrelated response");
                        None
                    }
                    Err(e) => {
                        warn!(kind = %kind, error = %e, "skipping unrecognized event");
                        None
                    }
                }
            })
            .boxed()
    }

    /// Send `request`, waiting for the correlated answer only when the server
    /// sends one.
    ///
    /// Fire-and-forget requests resolve to `None`. An `Error` frame from the
    /// server becomes [`ClientError::Server`].
    pub async fn call(&self, request: Request) -> Result<Option<Response>, ClientError> {
        let wait = request.expects_response();
        let raw = self.connection.send(request.to_value()?, wait).await?;
        if !wait {
            return Ok(None);
        }
        match Response::from_value(raw)? {
            Response::Error { message } => Err(ClientError::Server { message }),
            response => Ok(Some(response)),
        }
    }

    /// [`call`](Self::call) for a request the server answers.
    ///
    /// Fire-and-forget requests are rejected before anything is sent.
    pub async fn request(&self, request: Request) -> Result<Response, ClientError> {
        if !request.expects_response() {
            return Err(ClientError::NoResponse(request.kind()));
        }
        let kind = request.kind();
        self.call(request)
            .await?
            .ok_or(ClientError::NoResponse(kind))
    }

    /// Broadcast a chat message to the room.
    pub async fn chat(&self, message: impl Into<String>) -> Result<(), ClientError> {
        self.call(Request::Chat {
            message: message.into(),
            whisper_target_id: None,
        })
        .await?;
        Ok(())
    }

    /// Chat message only `user_id` can see.
    pub async fn whisper(
        &self,
        user_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.call(Request::Chat {
            message: message.into(),
            whisper_target_id: Some(user_id.into()),
        })
        .await?;
        Ok(())
    }

    /// Hidden message for other bots and client-side scripts.
    pub async fn channel(
        &self,
        message: impl Into<String>,
        tags: Option<Vec<String>>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::Channel {
                message: message.into(),
                tags,
            })
            .await?;
        expect_response!(response, Channel)
    }

    pub async fn emote(
        &self,
        emote_id: impl Into<String>,
        target_user_id: Option<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::Emote {
                emote_id: emote_id.into(),
                target_user_id,
            })
            .await?;
        expect_response!(response, Emote)
    }

    pub async fn react(
        &self,
        reaction: Reaction,
        target_user_id: impl Into<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::Reaction {
                reaction,
                target_user_id: target_user_id.into(),
            })
            .await?;
        expect_response!(response, Reaction)
    }

    /// Explicit keepalive. The connection already sends one periodically.
    pub async fn keepalive(&self) -> Result<(), ClientError> {
        let response = self.request(Request::Keepalive).await?;
        expect_response!(response, Keepalive)
    }

    pub async fn teleport(&self, user_id: impl Into<String>) -> Result<(), ClientError> {
        let response = self
            .request(Request::Teleport {
                user_id: user_id.into(),
            })
            .await?;
        expect_response!(response, Teleport)
    }

    pub async fn floor_hit(&self) -> Result<(), ClientError> {
        let response = self.request(Request::FloorHit).await?;
        expect_response!(response, FloorHit)
    }

    pub async fn anchor_hit(&self) -> Result<(), ClientError> {
        let response = self.request(Request::AnchorHit).await?;
        expect_response!(response, AnchorHit)
    }

    pub async fn get_room_users(&self) -> Result<Vec<(User, UserPosition)>, ClientError> {
        let response = self.request(Request::GetRoomUsers).await?;
        expect_response!(response, GetRoomUsers { content } => content)
    }

    pub async fn get_wallet(&self) -> Result<Vec<CurrencyItem>, ClientError> {
        let response = self.request(Request::GetWallet).await?;
        expect_response!(response, GetWallet { content } => content)
    }

    /// `action_length` is in seconds and only applies to bans and mutes.
    pub async fn moderate_room(
        &self,
        user_id: impl Into<String>,
        moderation_action: ModerationAction,
        action_length: Option<u64>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::ModerateRoom {
                user_id: user_id.into(),
                moderation_action,
                action_length,
            })
            .await?;
        expect_response!(response, ModerateRoom)
    }

    pub async fn get_room_privilege(&self, user_id: impl Into<String>) -> Result<(), ClientError> {
        let response = self
            .request(Request::GetRoomPrivilege {
                user_id: user_id.into(),
            })
            .await?;
        expect_response!(response, GetRoomPrivilege)
    }

    pub async fn change_room_privilege(
        &self,
        user_id: impl Into<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::ChangeRoomPrivilege {
                user_id: user_id.into(),
            })
            .await?;
        expect_response!(response, ChangeRoomPrivilege)
    }

    pub async fn move_user_to_room(
        &self,
        user_id: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::MoveUserToRoom {
                user_id: user_id.into(),
                room_id: room_id.into(),
            })
            .await?;
        expect_response!(response, MoveUserToRoom)
    }

    pub async fn invite_speaker(&self, user_id: impl Into<String>) -> Result<(), ClientError> {
        self.call(Request::InviteSpeaker {
            user_id: user_id.into(),
        })
        .await?;
        Ok(())
    }

    pub async fn remove_speaker(&self, user_id: impl Into<String>) -> Result<(), ClientError> {
        self.call(Request::RemoveSpeaker {
            user_id: user_id.into(),
        })
        .await?;
        Ok(())
    }

    /// Seconds of voice time left in the room.
    pub async fn check_voice_chat(&self) -> Result<u64, ClientError> {
        let response = self.request(Request::CheckVoiceChat).await?;
        expect_response!(response, CheckVoiceChat { seconds_left } => seconds_left)
    }

    pub async fn get_user_outfit(&self, user_id: impl Into<String>) -> Result<Vec<Item>, ClientError> {
        let response = self
            .request(Request::GetUserOutfit {
                user_id: user_id.into(),
            })
            .await?;
        expect_response!(response, GetUserOutfit { outfit } => outfit)
    }

    pub async fn get_backpack(&self, user_id: impl Into<String>) -> Result<(), ClientError> {
        self.call(Request::GetBackpack {
            user_id: user_id.into(),
        })
        .await?;
        Ok(())
    }

    pub async fn get_messages(
        &self,
        conversation_id: impl Into<String>,
        last_message_id: Option<String>,
    ) -> Result<Vec<Message>, ClientError> {
        let response = self
            .request(Request::GetMessages {
                conversation_id: conversation_id.into(),
                last_message_id,
            })
            .await?;
        expect_response!(response, GetMessages { messages } => messages)
    }

    pub async fn send_message(
        &self,
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        message_type: MessageCategory,
        room_id: Option<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::SendMessage {
                conversation_id: conversation_id.into(),
                content: content.into(),
                message_type,
                room_id,
            })
            .await?;
        expect_response!(response, SendMessage)
    }

    /// Conversations plus the number left out because the bot never joined.
    pub async fn get_conversations(
        &self,
        not_joined: Option<bool>,
        last_id: Option<String>,
    ) -> Result<(Vec<Conversation>, u32), ClientError> {
        let response = self
            .request(Request::GetConversations {
                not_joined,
                last_id,
            })
            .await?;
        expect_response!(
            response,
            GetConversations { conversations, not_joined } => (conversations, not_joined)
        )
    }

    pub async fn leave_conversation(
        &self,
        conversation_id: impl Into<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(Request::LeaveConversation {
                conversation_id: conversation_id.into(),
            })
            .await?;
        expect_response!(response, LeaveConversation)
    }

    pub async fn buy_voice_time(
        &self,
        payment_method: PaymentMethod,
    ) -> Result<PurchaseResult, ClientError> {
        let response = self
            .request(Request::BuyVoiceTime { payment_method })
            .await?;
        expect_response!(response, BuyVoiceTime { result } => result)
    }

    pub async fn buy_room_boost(
        &self,
        payment_method: PaymentMethod,
        amount: Option<u32>,
    ) -> Result<PurchaseResult, ClientError> {
        let response = self
            .request(Request::BuyRoomBoost {
                payment_method,
                amount,
            })
            .await?;
        expect_response!(response, BuyRoomBoost { result } => result)
    }

    pub async fn tip_user(
        &self,
        user_id: impl Into<String>,
        gold_bar: GoldBar,
    ) -> Result<PurchaseResult, ClientError> {
        let response = self
            .request(Request::TipUser {
                user_id: user_id.into(),
                gold_bar,
            })
            .await?;
        expect_response!(response, TipUser { result } => result)
    }

    pub async fn set_outfit(&self, outfit: Vec<Item>) -> Result<(), ClientError> {
        let response = self.request(Request::SetOutfit { outfit }).await?;
        expect_response!(response, SetOutfit)
    }

    pub async fn get_inventory(&self) -> Result<Vec<Item>, ClientError> {
        let response = self.request(Request::GetInventory).await?;
        expect_response!(response, GetInventory { items } => items)
    }

    pub async fn buy_item(&self, item_id: impl Into<String>) -> Result<PurchaseResult, ClientError> {
        let response = self
            .request(Request::BuyItem {
                item_id: item_id.into(),
            })
            .await?;
        expect_response!(response, BuyItem { result } => result)
    }
}
