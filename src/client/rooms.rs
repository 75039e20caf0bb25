//! Study-room endpoints

use super::wire::{CreateRoomRequest, RoomDto, RoomMessageDto, SendMessageRequest};
use super::{ApiClient, ClientError};
use crate::feed::{ConversationId, Identity, Message, Room};
use crate::runtime::{FeedSource, RoomDirectory, SubmitReceipt};
use async_trait::async_trait;

/// Room directory and room feeds, as seen by `viewer`
pub struct RoomClient {
    api: ApiClient,
    viewer: Identity,
}

impl RoomClient {
    pub fn new(api: ApiClient, viewer: Identity) -> Self {
        Self { api, viewer }
    }

    fn room_id(conversation: &ConversationId) -> Result<&str, ClientError> {
        match conversation {
            ConversationId::Room(id) => Ok(id),
            ConversationId::Mentor(_) => Err(ClientError::invalid_request(format!(
                "{conversation} is not a room"
            ))),
        }
    }
}

#[async_trait]
impl RoomDirectory for RoomClient {
    async fn list_rooms(&self) -> Result<Vec<Room>, ClientError> {
        let rooms: Vec<RoomDto> = self.api.get_json("/collab/rooms").await?;
        rooms.into_iter().map(RoomDto::into_room).collect()
    }

    async fn create_room(&self, topic: &str) -> Result<Room, ClientError> {
        let body = CreateRoomRequest {
            topic: topic.to_string(),
        };
        let room: RoomDto = self.api.post_json("/collab/rooms", &body).await?;
        room.into_room()
    }

    async fn join_room(&self, room_id: &str) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .api
            .post_json(&format!("/collab/rooms/{room_id}/join"), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FeedSource for RoomClient {
    async fn fetch(&self, conversation: &ConversationId) -> Result<Vec<Message>, ClientError> {
        let room_id = Self::room_id(conversation)?;
        let messages: Vec<RoomMessageDto> = self
            .api
            .get_json(&format!("/collab/rooms/{room_id}/messages"))
            .await?;
        // One malformed row must not hide the rest of the feed
        Ok(messages
            .into_iter()
            .filter_map(|m| {
                let id = m.id.clone();
                match m.into_message(&self.viewer.id) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!(%room_id, message_id = %id, error = %e, "Skipping malformed message");
                        None
                    }
                }
            })
            .collect())
    }

    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitReceipt, ClientError> {
        let room_id = Self::room_id(conversation)?;
        let body = SendMessageRequest {
            text: text.to_string(),
        };
        let stored: RoomMessageDto = self
            .api
            .post_json(&format!("/collab/rooms/{room_id}/messages"), &body)
            .await?;
        Ok(SubmitReceipt::confirmed(stored.into_message(&self.viewer.id)?))
    }
}
