//! Wire formats of the study-room backend

use super::ClientError;
use crate::feed::{AuthorRole, ConversationId, Identity, Message, MessageId, Room, UserRole};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MENTOR_AUTHOR_ID: &str = "mentor";
pub const MENTOR_AUTHOR_NAME: &str = "Mentor";

/// `GET /auth/me`
#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl From<UserDto> for Identity {
    fn from(dto: UserDto) -> Self {
        Identity {
            id: dto.id,
            name: dto.name,
            role: dto.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    pub topic: String,
    pub created_by: String,
    pub created_by_name: String,
    #[serde(default)]
    pub members: Vec<String>,
    pub created_at: String,
}

impl RoomDto {
    pub fn into_room(self) -> Result<Room, ClientError> {
        let created_at = parse_timestamp(&self.created_at)?;
        Ok(Room::new(
            self.id,
            self.topic,
            self.created_by,
            self.created_by_name,
            self.members,
            created_at,
        ))
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessageDto {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: String,
}

impl RoomMessageDto {
    /// Messages by `viewer_id` are the user's own; everyone else is a peer
    pub fn into_message(self, viewer_id: &str) -> Result<Message, ClientError> {
        let author_role = if self.sender == viewer_id {
            AuthorRole::User
        } else {
            AuthorRole::Peer
        };
        Ok(Message {
            timestamp: parse_timestamp(&self.timestamp)?,
            id: MessageId::Server(self.id),
            conversation_id: ConversationId::Room(self.room_id),
            author_role,
            author_id: self.sender,
            author_name: self.sender_name,
            text: self.text,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorChatDto {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    /// `user` or `assistant`
    pub role: String,
    pub message: String,
    pub timestamp: String,
}

impl MentorChatDto {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    pub fn into_message(self, owner: &Identity) -> Result<Message, ClientError> {
        let (author_role, author_id, author_name) = if self.is_assistant() {
            (
                AuthorRole::Assistant,
                MENTOR_AUTHOR_ID.to_string(),
                MENTOR_AUTHOR_NAME.to_string(),
            )
        } else {
            (AuthorRole::User, self.user_id, owner.name.clone())
        };
        Ok(Message {
            timestamp: parse_timestamp(&self.timestamp)?,
            id: MessageId::Server(self.id),
            conversation_id: ConversationId::Mentor(self.session_id),
            author_role,
            author_id,
            author_name,
            text: self.message,
        })
    }
}

/// `POST /ai/mentor` response. Older backends return only `response`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorReplyDto {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<MentorChatDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_message: Option<MentorChatDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorChatRequest {
    pub session_id: String,
    pub message: String,
}

/// RFC 3339, or a naive ISO timestamp taken as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ClientError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| ClientError::decode(format!("Bad timestamp {raw:?}: {e}")))
}
