//! Property-based tests for feed reconciliation
//!
//! These tests verify ordering and deduplication hold across arbitrary
//! interleavings of store operations.

use super::*;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn conv() -> ConversationId {
    ConversationId::room("prop-room")
}

fn message(id: MessageId, author: &str, secs: i64, text: String) -> Message {
    Message {
        id,
        conversation_id: conv(),
        author_role: if author == "me" {
            AuthorRole::User
        } else {
            AuthorRole::Peer
        },
        author_id: author.to_string(),
        author_name: author.to_uppercase(),
        text,
        timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
    }
}

/// Small id and time domains so duplicates and ties actually happen
fn arb_confirmed() -> impl Strategy<Value = Message> {
    (0u8..12, prop_oneof![Just("me"), Just("them")], 0i64..8, "[ab]{1,2}").prop_map(
        |(id, author, secs, text)| message(MessageId::server(format!("m{id}")), author, secs, text),
    )
}

fn arb_optimistic() -> impl Strategy<Value = Message> {
    (0u64..6, 0i64..8, "[ab]{1,2}").prop_map(|(temp, secs, text)| {
        message(MessageId::Temp(TempId::from_raw(temp)), "me", secs, text)
    })
}

fn arb_batch() -> impl Strategy<Value = Vec<Message>> {
    proptest::collection::vec(arb_confirmed(), 0..8)
}

#[derive(Debug, Clone)]
enum Op {
    Append(Message),
    Replace(u64, Message),
    Retract(u64),
    Merge(Vec<Message>),
    Confirm(u64, Message),
    Fail(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_confirmed().prop_map(Op::Append),
        arb_optimistic().prop_map(Op::Append),
        (0u64..6, arb_confirmed()).prop_map(|(t, m)| Op::Replace(t, m)),
        (0u64..6).prop_map(Op::Retract),
        arb_batch().prop_map(Op::Merge),
        (0u64..6, arb_confirmed()).prop_map(|(t, m)| Op::Confirm(t, m)),
        (0u64..6).prop_map(Op::Fail),
    ]
}

fn apply(store: &mut FeedStore, op: Op) {
    match op {
        Op::Append(m) => {
            store.append(m);
        }
        Op::Replace(t, m) => {
            store.replace(TempId::from_raw(t), m);
        }
        Op::Retract(t) => {
            store.retract(TempId::from_raw(t));
        }
        Op::Merge(batch) => {
            store.merge(batch);
        }
        Op::Confirm(t, m) => {
            reconcile(
                store,
                SyncEvent::SubmitConfirmed {
                    temp_id: TempId::from_raw(t),
                    confirmed: Some(m),
                    replies: vec![],
                },
            );
        }
        Op::Fail(t) => {
            reconcile(
                store,
                SyncEvent::SubmitFailed {
                    temp_id: TempId::from_raw(t),
                },
            );
        }
    }
}

fn assert_invariants(store: &FeedStore) -> Result<(), TestCaseError> {
    let msgs = store.messages();
    for pair in msgs.windows(2) {
        prop_assert!(
            pair[0].sort_key() <= pair[1].sort_key(),
            "out of order: {:?} then {:?}",
            pair[0].id,
            pair[1].id
        );
    }
    let mut seen = HashSet::new();
    for m in msgs {
        prop_assert!(seen.insert(m.id.clone()), "duplicate id {}", m.id);
    }
    let optimistic = msgs.iter().filter(|m| m.is_optimistic()).count();
    prop_assert_eq!(optimistic, store.pending_count());
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_any_op_sequence_stays_sorted_and_unique(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut store = FeedStore::new(conv());
        for op in ops {
            apply(&mut store, op);
            assert_invariants(&store)?;
        }
    }

    #[test]
    fn prop_merge_is_idempotent(
        setup in proptest::collection::vec(arb_op(), 0..20),
        batch in arb_batch(),
    ) {
        let mut store = FeedStore::new(conv());
        for op in setup {
            apply(&mut store, op);
        }
        store.merge(batch.clone());
        let once = store.messages().to_vec();
        let second = store.merge(batch);
        prop_assert!(!second.changed());
        prop_assert_eq!(once, store.messages().to_vec());
    }

    #[test]
    fn prop_failure_never_leaves_the_entry(secs in 0i64..8, text in "[ab]{1,3}", temp in 0u64..6) {
        let mut store = FeedStore::new(conv());
        store.append(message(MessageId::Temp(TempId::from_raw(temp)), "me", secs, text.clone()));
        reconcile(&mut store, SyncEvent::SubmitFailed { temp_id: TempId::from_raw(temp) });
        prop_assert!(store.messages().iter().all(|m| m.text != text));
    }

    #[test]
    fn prop_poll_and_confirm_race_leaves_one_message(
        secs in 0i64..8,
        text in "[ab]{1,3}",
        confirm_first in any::<bool>(),
    ) {
        let temp_id = TempId::from_raw(1);
        let mut store = FeedStore::new(conv());
        store.append(message(MessageId::Temp(temp_id), "me", secs, text.clone()));
        let confirmed = message(MessageId::server("m1"), "me", secs, text.clone());

        let poll = SyncEvent::PollBatch { messages: vec![confirmed.clone()] };
        let confirm = SyncEvent::SubmitConfirmed {
            temp_id,
            confirmed: Some(confirmed),
            replies: vec![],
        };
        if confirm_first {
            reconcile(&mut store, confirm);
            reconcile(&mut store, poll);
        } else {
            reconcile(&mut store, poll);
            reconcile(&mut store, confirm);
        }

        let matching = store.messages().iter().filter(|m| m.text == text).count();
        prop_assert_eq!(matching, 1);
        prop_assert_eq!(store.pending_count(), 0);
    }
}
