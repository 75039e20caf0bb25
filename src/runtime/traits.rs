//! Trait abstractions for the remote collaborators
//!
//! These traits enable testing the runtime with mock implementations.

use crate::client::ClientError;
use crate::feed::{ConversationId, Identity, Message, Room};
use async_trait::async_trait;
use std::sync::Arc;

/// Result of a successful submit
#[derive(Debug, Clone, Default)]
pub struct SubmitReceipt {
    /// Stored form of the submitted message, if the collaborator returned it
    pub confirmed: Option<Message>,
    /// Messages produced in response (the mentor's reply)
    pub replies: Vec<Message>,
}

impl SubmitReceipt {
    pub fn confirmed(message: Message) -> Self {
        Self {
            confirmed: Some(message),
            replies: Vec::new(),
        }
    }

    pub fn with_reply(mut self, reply: Message) -> Self {
        self.replies.push(reply);
        self
    }
}

/// Supplies the signed-in user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Result<Identity, ClientError>;
}

/// Rooms that exist and joining them
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// All rooms, newest first
    async fn list_rooms(&self) -> Result<Vec<Room>, ClientError>;

    /// Create a room; the caller becomes its first member
    async fn create_room(&self, topic: &str) -> Result<Room, ClientError>;

    /// Join a room. Joining twice is not an error.
    async fn join_room(&self, room_id: &str) -> Result<(), ClientError>;
}

/// Authoritative message feed of a conversation
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current feed
    async fn fetch(&self, conversation: &ConversationId) -> Result<Vec<Message>, ClientError>;

    /// Submit a new message authored by the current user
    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitReceipt, ClientError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    async fn current_identity(&self) -> Result<Identity, ClientError> {
        (**self).current_identity().await
    }
}

#[async_trait]
impl<T: RoomDirectory + ?Sized> RoomDirectory for Arc<T> {
    async fn list_rooms(&self) -> Result<Vec<Room>, ClientError> {
        (**self).list_rooms().await
    }

    async fn create_room(&self, topic: &str) -> Result<Room, ClientError> {
        (**self).create_room(topic).await
    }

    async fn join_room(&self, room_id: &str) -> Result<(), ClientError> {
        (**self).join_room(room_id).await
    }
}

#[async_trait]
impl<T: FeedSource + ?Sized> FeedSource for Arc<T> {
    async fn fetch(&self, conversation: &ConversationId) -> Result<Vec<Message>, ClientError> {
        (**self).fetch(conversation).await
    }

    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitReceipt, ClientError> {
        (**self).submit(conversation, text).await
    }
}
