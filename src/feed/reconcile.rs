//! Reconciliation of optimistic and confirmed messages
//!
//! Every operation here is idempotent, so completions may be applied in
//! whatever order they arrive.

use super::{FeedStore, Message, MessageId, TempId};

/// Authoritative information about a feed
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A submit succeeded.
    ///
    /// `confirmed` is the stored form of the optimistic entry when the
    /// collaborator returns it; `replies` are further messages the submit
    /// produced (the mentor's answer).
    SubmitConfirmed {
        temp_id: TempId,
        confirmed: Option<Message>,
        replies: Vec<Message>,
    },
    /// A submit failed; the provisional entry must not be shown as sent
    SubmitFailed { temp_id: TempId },
    /// Full feed, or a suffix of it, fetched from the server
    PollBatch { messages: Vec<Message> },
}

/// What a reconciliation changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Confirmed ids newly added to the feed
    pub appended: Vec<String>,
    /// Optimistic entries swapped for their confirmed form
    pub promoted: Vec<(TempId, String)>,
    pub retracted: Vec<TempId>,
    /// Batch entries dropped: optimistic ids or another conversation's messages
    pub skipped: usize,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        !(self.appended.is_empty() && self.promoted.is_empty() && self.retracted.is_empty())
    }

    fn absorb(&mut self, other: Outcome) {
        self.appended.extend(other.appended);
        self.promoted.extend(other.promoted);
        self.retracted.extend(other.retracted);
        self.skipped += other.skipped;
    }
}

/// Apply an event to a feed
pub fn reconcile(store: &mut FeedStore, event: SyncEvent) -> Outcome {
    match event {
        SyncEvent::SubmitConfirmed {
            temp_id,
            confirmed,
            replies,
        } => {
            let mut outcome = match confirmed {
                Some(confirmed) => confirm(store, temp_id, confirmed),
                None => Outcome::default(),
            };
            outcome.absorb(merge_batch(store, replies));
            outcome
        }
        SyncEvent::SubmitFailed { temp_id } => {
            let mut outcome = Outcome::default();
            if store.retract(temp_id) {
                outcome.retracted.push(temp_id);
            }
            outcome
        }
        SyncEvent::PollBatch { messages } => merge_batch(store, messages),
    }
}

fn confirm(store: &mut FeedStore, temp_id: TempId, confirmed: Message) -> Outcome {
    let mut outcome = Outcome::default();
    // A poll already promoted this entry
    if store.is_resolved(temp_id) {
        return outcome;
    }
    let Some(id) = confirmed.id.as_server().map(str::to_owned) else {
        outcome.skipped += 1;
        return outcome;
    };
    if store.replace(temp_id, confirmed.clone()) {
        outcome.promoted.push((temp_id, id));
    } else if store.append(confirmed) {
        // The view was reset while the submit was in flight
        outcome.appended.push(id);
    }
    outcome
}

/// Merge confirmed messages into the feed.
///
/// Messages already present by id are left untouched. A new message with
/// the same author and text as a pending optimistic entry, stored no
/// earlier than the entry was written, is that entry's confirmation
/// arriving ahead of the submit response: it takes the
/// entry's place and the temp id is marked resolved. Other optimistic
/// entries stay where the ordering puts them.
pub fn merge_batch(store: &mut FeedStore, batch: Vec<Message>) -> Outcome {
    let mut outcome = Outcome::default();
    for message in batch {
        let MessageId::Server(id) = message.id.clone() else {
            outcome.skipped += 1;
            continue;
        };
        if &message.conversation_id != store.conversation() {
            outcome.skipped += 1;
            continue;
        }
        if store.contains_confirmed(&id) {
            continue;
        }
        if let Some(temp_id) = store.matching_pending(&message) {
            store.resolve(temp_id, message);
            outcome.promoted.push((temp_id, id));
        } else if store.append(message) {
            outcome.appended.push(id);
        }
    }
    outcome
}
