//! Conversation feeds
//!
//! Pure data structures: one conversation's ordered message list and the
//! reconciliation of optimistic entries with authoritative server data.
//! Nothing here performs I/O.

mod conversation;
mod message;
pub(crate) mod reconcile;
mod store;

#[cfg(test)]
mod proptests;

pub use conversation::{Identity, MentorSession, Room, UserRole};
pub use message::{AuthorRole, ConversationId, Message, MessageId, Origin, TempId};
pub use reconcile::{reconcile, Outcome, SyncEvent};
pub use store::FeedStore;
