//! Ordered message list for one conversation

use super::{ConversationId, Message, MessageId, TempId};
use chrono::Duration;
use std::collections::{HashMap, HashSet};

/// How far a server timestamp may trail the local clock and still confirm
/// a pending entry
const CLOCK_SKEW_SECS: i64 = 120;

/// Message feed of a single conversation.
///
/// Messages are kept sorted by `(timestamp, id)`. Equal keys keep insertion
/// order, although unique ids make that unreachable in practice. Confirmed
/// ids are unique; optimistic entries are additionally tracked by temp id so
/// the reconciler can promote or retract them.
#[derive(Debug, Clone)]
pub struct FeedStore {
    conversation: ConversationId,
    messages: Vec<Message>,
    confirmed: HashSet<String>,
    pending: HashMap<TempId, Message>,
    /// Temp ids promoted by a poll before their submit response arrived
    resolved: HashSet<TempId>,
}

impl FeedStore {
    pub fn new(conversation: ConversationId) -> Self {
        Self {
            conversation,
            messages: Vec::new(),
            confirmed: HashSet::new(),
            pending: HashMap::new(),
            resolved: HashSet::new(),
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains_confirmed(&self, id: &str) -> bool {
        self.confirmed.contains(id)
    }

    pub fn pending(&self, temp_id: TempId) -> Option<&Message> {
        self.pending.get(&temp_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_resolved(&self, temp_id: TempId) -> bool {
        self.resolved.contains(&temp_id)
    }

    /// Insert in sorted position.
    ///
    /// Returns false, leaving the store unchanged, if the message is already
    /// present: a confirmed id already stored, or a temp id pending or resolved.
    pub fn append(&mut self, message: Message) -> bool {
        match &message.id {
            MessageId::Server(id) => {
                if !self.confirmed.insert(id.clone()) {
                    return false;
                }
            }
            MessageId::Temp(temp_id) => {
                if self.pending.contains_key(temp_id) || self.resolved.contains(temp_id) {
                    return false;
                }
                self.pending.insert(*temp_id, message.clone());
            }
        }
        self.insert_sorted(message);
        true
    }

    /// Swap the optimistic entry `temp_id` for its confirmed counterpart.
    ///
    /// Returns false if `temp_id` is not pending. When the confirmed id is
    /// already present the optimistic entry is simply dropped.
    pub fn replace(&mut self, temp_id: TempId, confirmed: Message) -> bool {
        if !self.remove_pending(temp_id) {
            return false;
        }
        self.append(confirmed);
        true
    }

    /// Drop the optimistic entry `temp_id`. Returns false if it is not pending.
    pub fn retract(&mut self, temp_id: TempId) -> bool {
        self.remove_pending(temp_id)
    }

    /// Like [`replace`](Self::replace), but also remembers `temp_id` as
    /// resolved so later confirmations or failures for it are ignored.
    pub fn resolve(&mut self, temp_id: TempId, confirmed: Message) -> bool {
        if !self.replace(temp_id, confirmed) {
            return false;
        }
        self.resolved.insert(temp_id);
        true
    }

    /// Merge an authoritative batch. See [`super::reconcile::merge_batch`].
    pub fn merge(&mut self, batch: Vec<Message>) -> super::Outcome {
        super::reconcile::merge_batch(self, batch)
    }

    /// Earliest pending entry with the same author and text as `confirmed`.
    ///
    /// Messages stored before the entry was written (allowing for clock
    /// skew) are history that happens to repeat the text, not its
    /// confirmation.
    pub(crate) fn matching_pending(&self, confirmed: &Message) -> Option<TempId> {
        let skew = Duration::seconds(CLOCK_SKEW_SECS);
        self.pending
            .iter()
            .filter(|(_, pending)| pending.same_content(confirmed))
            .filter(|(_, pending)| confirmed.timestamp >= pending.timestamp - skew)
            .min_by(|(_, a), (_, b)| a.sort_key().cmp(&b.sort_key()))
            .map(|(temp_id, _)| *temp_id)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.confirmed.clear();
        self.pending.clear();
        self.resolved.clear();
    }

    fn remove_pending(&mut self, temp_id: TempId) -> bool {
        if self.pending.remove(&temp_id).is_none() {
            return false;
        }
        let id = MessageId::Temp(temp_id);
        self.messages.retain(|m| m.id != id);
        true
    }

    fn insert_sorted(&mut self, message: Message) {
        let key = message.sort_key();
        let pos = self.messages.partition_point(|m| m.sort_key() <= key);
        self.messages.insert(pos, message);
    }
}
