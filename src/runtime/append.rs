//! Optimistic entries for outgoing messages

use super::error::{SyncError, SyncResult};
use crate::feed::{AuthorRole, ConversationId, Identity, Message, MessageId, TempId};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique temp id
pub fn next_temp_id() -> TempId {
    TempId::from_raw(NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed))
}

/// Reject messages that are blank after trimming.
///
/// The text itself is sent untrimmed, exactly as typed.
pub fn validate_text(text: &str) -> SyncResult<()> {
    if text.trim().is_empty() {
        return Err(SyncError::EmptyMessage);
    }
    Ok(())
}

/// Provisional message authored by `author`, stamped with the local clock
pub fn optimistic_message(
    conversation: &ConversationId,
    author: &Identity,
    temp_id: TempId,
    text: &str,
) -> Message {
    Message {
        id: MessageId::Temp(temp_id),
        conversation_id: conversation.clone(),
        author_role: AuthorRole::User,
        author_id: author.id.clone(),
        author_name: author.name.clone(),
        text: text.to_string(),
        timestamp: Utc::now(),
    }
}
