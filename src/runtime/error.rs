//! Sync error types

use crate::client::ClientError;
use crate::feed::ConversationId;
use thiserror::Error;

/// Errors surfaced to callers of the sync runtime.
///
/// None of these are fatal: the conversation stays usable after any of them.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// A send's remote call did not succeed; its entry was retracted
    #[error("Failed to send message: {0}")]
    SubmitFailed(#[source] ClientError),
    /// A fetch did not succeed; retried on the next tick
    #[error("Failed to fetch messages: {0}")]
    FetchFailed(#[source] ClientError),
    #[error("Not a member of {0}")]
    MembershipRequired(ConversationId),
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Room topic is empty")]
    EmptyTopic,
    #[error("{0} is not open")]
    NotOpen(ConversationId),
    /// The view was closed before the request was processed
    #[error("Conversation view closed")]
    Closed,
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type SyncResult<T> = Result<T, SyncError>;
