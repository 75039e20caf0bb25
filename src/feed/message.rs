//! Message and identifier types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Locally generated id for a message the server has not confirmed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TempId(u64);

impl TempId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

/// Message identifier.
///
/// Server-assigned and temporary ids live in separate variants, so the two id
/// spaces can never collide. `Server` is declared first: at equal timestamps a
/// confirmed message sorts before any optimistic one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageId {
    Server(String),
    Temp(TempId),
}

impl MessageId {
    pub fn server(id: impl Into<String>) -> Self {
        MessageId::Server(id.into())
    }

    pub fn as_server(&self) -> Option<&str> {
        match self {
            MessageId::Server(id) => Some(id),
            MessageId::Temp(_) => None,
        }
    }

    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            MessageId::Temp(id) => Some(*id),
            MessageId::Server(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Server(id) => f.write_str(id),
            MessageId::Temp(id) => id.fmt(f),
        }
    }
}

impl From<TempId> for MessageId {
    fn from(id: TempId) -> Self {
        MessageId::Temp(id)
    }
}

/// Who wrote a message, relative to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    /// The current user
    User,
    /// The mentor agent
    Assistant,
    /// Another room member
    Peer,
}

/// Whether a message is still provisional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Optimistic,
    Confirmed,
}

/// Conversation a message belongs to: the unit of ordering and polling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConversationId {
    Room(String),
    Mentor(String),
}

impl ConversationId {
    pub fn room(id: impl Into<String>) -> Self {
        ConversationId::Room(id.into())
    }

    pub fn mentor(session_id: impl Into<String>) -> Self {
        ConversationId::Mentor(session_id.into())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationId::Room(id) => write!(f, "room:{id}"),
            ConversationId::Mentor(id) => write!(f, "mentor:{id}"),
        }
    }
}

/// A message in a conversation feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub author_role: AuthorRole,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Optimistic iff the id is temporary
    pub fn origin(&self) -> Origin {
        match self.id {
            MessageId::Server(_) => Origin::Confirmed,
            MessageId::Temp(_) => Origin::Optimistic,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.origin() == Origin::Optimistic
    }

    pub fn temp_id(&self) -> Option<TempId> {
        self.id.as_temp()
    }

    /// Ordering key within a conversation
    pub fn sort_key(&self) -> (DateTime<Utc>, &MessageId) {
        (self.timestamp, &self.id)
    }

    /// Whether `other` records the same authored content as `self`
    pub fn same_content(&self, other: &Message) -> bool {
        self.author_id == other.author_id && self.text == other.text
    }
}
