//! Room membership tracking

use super::error::{SyncError, SyncResult};
use super::traits::RoomDirectory;
use crate::feed::{ConversationId, Room};
use std::collections::HashSet;
use std::sync::Arc;

/// Rooms that exist and which of them the caller belongs to.
///
/// Membership is a set: joining twice changes nothing. There is no leave.
pub struct MembershipManager {
    directory: Arc<dyn RoomDirectory>,
    user_id: String,
    rooms: Vec<Room>,
    joined: HashSet<String>,
}

impl MembershipManager {
    pub fn new(directory: Arc<dyn RoomDirectory>, user_id: impl Into<String>) -> Self {
        Self {
            directory,
            user_id: user_id.into(),
            rooms: Vec::new(),
            joined: HashSet::new(),
        }
    }

    /// Refresh the room list from the directory, newest first
    pub async fn list_rooms(&mut self) -> SyncResult<&[Room]> {
        let rooms = self.directory.list_rooms().await?;
        self.joined.extend(
            rooms
                .iter()
                .filter(|room| room.has_member(&self.user_id))
                .map(|room| room.id.clone()),
        );
        self.rooms = rooms;
        tracing::debug!(
            rooms = self.rooms.len(),
            joined = self.joined.len(),
            "Room list refreshed"
        );
        Ok(&self.rooms)
    }

    /// Create a room. The creator is a member from the start.
    pub async fn create_room(&mut self, topic: &str) -> SyncResult<Room> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SyncError::EmptyTopic);
        }
        let mut room = self.directory.create_room(topic).await?;
        room.add_member(self.user_id.clone());
        self.joined.insert(room.id.clone());
        self.rooms.retain(|r| r.id != room.id);
        self.rooms.insert(0, room.clone());
        tracing::info!(room = %room.id, topic = %room.topic, "Room created");
        Ok(room)
    }

    /// Join a room. Returns false if already a member, without a remote call.
    pub async fn join_room(&mut self, room_id: &str) -> SyncResult<bool> {
        if self.joined.contains(room_id) {
            tracing::debug!(room = %room_id, "Already a member");
            return Ok(false);
        }
        self.directory.join_room(room_id).await?;
        self.joined.insert(room_id.to_string());
        if let Some(room) = self.rooms.iter_mut().find(|r| r.id == room_id) {
            room.add_member(self.user_id.clone());
        }
        tracing::info!(room = %room_id, "Joined room");
        Ok(true)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn is_member(&self, room_id: &str) -> bool {
        self.joined.contains(room_id)
    }

    pub fn require_member(&self, room_id: &str) -> SyncResult<()> {
        if self.is_member(room_id) {
            Ok(())
        } else {
            Err(SyncError::MembershipRequired(ConversationId::room(room_id)))
        }
    }
}
