//! Conversations and the people in them

use super::ConversationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Account role as reported by the auth collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    /// Unknown roles are treated as plain users
    #[default]
    #[serde(other)]
    User,
}

/// The signed-in user; trusted for attributing authored messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: UserRole::User,
        }
    }
}

/// A collaborative study room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub topic: String,
    pub created_by: String,
    pub created_by_name: String,
    /// Always contains `created_by`
    members: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        created_by: impl Into<String>,
        created_by_name: impl Into<String>,
        members: impl IntoIterator<Item = String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let created_by = created_by.into();
        let mut members: BTreeSet<String> = members.into_iter().collect();
        members.insert(created_by.clone());
        Self {
            id: id.into(),
            topic: topic.into(),
            created_by,
            created_by_name: created_by_name.into(),
            members,
            created_at,
        }
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    /// Returns false if the user was already a member
    pub fn add_member(&mut self, user_id: impl Into<String>) -> bool {
        self.members.insert(user_id.into())
    }

    pub fn conversation_id(&self) -> ConversationId {
        ConversationId::room(&self.id)
    }
}

/// A private conversation between one user and the mentor agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorSession {
    pub id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl MentorSession {
    /// Start a fresh session owned by `owner`
    pub fn start(owner: &Identity) -> Self {
        Self {
            id: format!("session-{}", uuid::Uuid::new_v4()),
            owner_id: owner.id.clone(),
            created_at: Utc::now(),
        }
    }

    /// Resume a session whose id is already known
    pub fn resume(id: impl Into<String>, owner: &Identity) -> Self {
        Self {
            id: id.into(),
            owner_id: owner.id.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        ConversationId::mentor(&self.id)
    }
}
