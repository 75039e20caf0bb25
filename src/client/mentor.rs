//! Mentor session endpoints

use super::wire::{MentorChatDto, MentorChatRequest, MentorReplyDto};
use super::{ApiClient, ClientError};
use crate::feed::{AuthorRole, ConversationId, Identity, Message};
use crate::runtime::{FeedSource, SubmitReceipt};
use async_trait::async_trait;

/// Mentor conversation feeds owned by `owner`
pub struct MentorClient {
    api: ApiClient,
    owner: Identity,
}

impl MentorClient {
    pub fn new(api: ApiClient, owner: Identity) -> Self {
        Self { api, owner }
    }

    fn session_id(conversation: &ConversationId) -> Result<&str, ClientError> {
        match conversation {
            ConversationId::Mentor(id) => Ok(id),
            ConversationId::Room(_) => Err(ClientError::invalid_request(format!(
                "{conversation} is not a mentor session"
            ))),
        }
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Message>, ClientError> {
        let rows: Vec<MentorChatDto> = self
            .api
            .get_json(&format!("/ai/mentor/history/{session_id}"))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                match row.into_message(&self.owner) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!(%session_id, row_id = %id, error = %e, "Skipping malformed history row");
                        None
                    }
                }
            })
            .collect())
    }
}

/// Locate the stored question and its answer in a session history.
///
/// The question is the latest user row with the submitted text; the answer
/// is the first assistant row after it.
fn find_exchange(history: Vec<Message>, text: &str) -> SubmitReceipt {
    let Some(question_idx) = history
        .iter()
        .rposition(|m| m.author_role == AuthorRole::User && m.text == text)
    else {
        return SubmitReceipt::default();
    };
    let mut rest = history.into_iter().skip(question_idx);
    let question = rest.next();
    let answer = rest.find(|m| m.author_role == AuthorRole::Assistant);
    SubmitReceipt {
        confirmed: question,
        replies: answer.into_iter().collect(),
    }
}

#[async_trait]
impl FeedSource for MentorClient {
    async fn fetch(&self, conversation: &ConversationId) -> Result<Vec<Message>, ClientError> {
        self.history(Self::session_id(conversation)?).await
    }

    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitReceipt, ClientError> {
        let session_id = Self::session_id(conversation)?;
        let body = MentorChatRequest {
            session_id: session_id.to_string(),
            message: text.to_string(),
        };
        let reply: MentorReplyDto = self.api.post_json("/ai/mentor", &body).await?;

        if let (Some(question), Some(answer)) = (reply.user_message, reply.assistant_message) {
            return Ok(SubmitReceipt::confirmed(question.into_message(&self.owner)?)
                .with_reply(answer.into_message(&self.owner)?));
        }

        // Only the reply text came back: read the stored rows from history.
        // If that fails the send still succeeded; the next fetch reconciles.
        match self.history(session_id).await {
            Ok(history) => Ok(find_exchange(history, text)),
            Err(e) => {
                tracing::warn!(
                    %conversation,
                    error = %e,
                    "Mentor history read-back failed"
                );
                Ok(SubmitReceipt::default())
            }
        }
    }
}
