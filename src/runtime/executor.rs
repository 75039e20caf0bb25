//! Conversation runtime executor
//!
//! One task per open view. It exclusively owns the view's `FeedStore` and
//! poll state; remote calls run in spawned tasks and report back as events,
//! so reconciliation happens in completion order without any locking.

use super::append::{next_temp_id, optimistic_message};
use super::error::SyncError;
use super::poll::{spawn_ticker, FetchTicket, PollConfig, PollScheduler};
use super::traits::{FeedSource, SubmitReceipt};
use super::SyncNotice;
use crate::client::ClientError;
use crate::feed::{reconcile, ConversationId, FeedStore, Identity, Message, SyncEvent, TempId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Events processed by a conversation runtime
pub(crate) enum Event {
    /// User action: append optimistically, then submit
    Send {
        text: String,
        reply: oneshot::Sender<TempId>,
    },
    Activate,
    Deactivate,
    /// Fetch once now, outside the ticker schedule
    Refresh,
    Tick {
        generation: u64,
    },
    FetchCompleted {
        ticket: FetchTicket,
        result: Result<Vec<Message>, ClientError>,
    },
    SubmitCompleted {
        temp_id: TempId,
        text: String,
        result: Result<SubmitReceipt, ClientError>,
    },
}

/// Generic conversation runtime that can work with any feed source
pub struct ConversationRuntime<S>
where
    S: FeedSource + ?Sized + 'static,
{
    conversation: ConversationId,
    identity: Identity,
    store: FeedStore,
    poll: PollScheduler,
    config: PollConfig,
    source: Arc<S>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    snapshot_tx: watch::Sender<Vec<Message>>,
    notice_tx: broadcast::Sender<SyncNotice>,
    /// Cancels the ticker of the current activation
    ticker_cancel: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl<S> ConversationRuntime<S>
where
    S: FeedSource + ?Sized + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        conversation: ConversationId,
        identity: Identity,
        config: PollConfig,
        source: Arc<S>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        snapshot_tx: watch::Sender<Vec<Message>>,
        notice_tx: broadcast::Sender<SyncNotice>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store: FeedStore::new(conversation.clone()),
            conversation,
            identity,
            poll: PollScheduler::new(),
            config,
            source,
            event_rx,
            event_tx,
            snapshot_tx,
            notice_tx,
            ticker_cancel: None,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(conversation = %self.conversation, "Starting conversation runtime");

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                Some(event) = self.event_rx.recv() => self.process_event(event),
                else => break,
            }
        }

        self.stop_ticker();
        tracing::info!(
            conversation = %self.conversation,
            pending = self.store.pending_count(),
            "Conversation runtime stopped"
        );
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Send { text, reply } => self.handle_send(text, reply),
            Event::Activate => self.handle_activate(),
            Event::Deactivate => self.handle_deactivate(),
            Event::Refresh => self.request_follow_up_fetch(),
            Event::Tick { generation } => {
                if self.poll.active_generation() == Some(generation) {
                    self.request_fetch();
                } else {
                    tracing::debug!(generation, "Ignoring tick from previous activation");
                }
            }
            Event::FetchCompleted { ticket, result } => self.handle_fetch_completed(ticket, result),
            Event::SubmitCompleted {
                temp_id,
                text,
                result,
            } => self.handle_submit_completed(temp_id, text, result),
        }
    }

    fn handle_send(&mut self, text: String, reply: oneshot::Sender<TempId>) {
        let temp_id = next_temp_id();
        let message = optimistic_message(&self.conversation, &self.identity, temp_id, &text);
        self.store.append(message);
        self.publish();
        let _ = reply.send(temp_id);

        tracing::debug!(conversation = %self.conversation, %temp_id, "Submitting message");

        // Not cancellable: the completion is applied even after deactivation
        let source = Arc::clone(&self.source);
        let event_tx = self.event_tx.clone();
        let conversation = self.conversation.clone();
        tokio::spawn(async move {
            let result = source.submit(&conversation, &text).await;
            let completed = Event::SubmitCompleted {
                temp_id,
                text,
                result,
            };
            if event_tx.send(completed).await.is_err() {
                tracing::debug!(%conversation, %temp_id, "View closed, discarding submit result");
            }
        });
    }

    fn handle_submit_completed(
        &mut self,
        temp_id: TempId,
        text: String,
        result: Result<SubmitReceipt, ClientError>,
    ) {
        match result {
            Ok(receipt) => {
                let unconfirmed = receipt.confirmed.is_none();
                let outcome = reconcile(
                    &mut self.store,
                    SyncEvent::SubmitConfirmed {
                        temp_id,
                        confirmed: receipt.confirmed,
                        replies: receipt.replies,
                    },
                );
                tracing::debug!(
                    conversation = %self.conversation,
                    %temp_id,
                    promoted = outcome.promoted.len(),
                    appended = outcome.appended.len(),
                    "Submit confirmed"
                );
                if outcome.changed() {
                    self.publish();
                }
                // Without the stored message or a poll timer, only a fetch
                // can promote the entry or bring in other members' messages
                if unconfirmed || !self.config.enabled {
                    self.request_follow_up_fetch();
                }
            }
            Err(error) => {
                reconcile(&mut self.store, SyncEvent::SubmitFailed { temp_id });
                self.publish();
                tracing::warn!(
                    conversation = %self.conversation,
                    %temp_id,
                    kind = ?error.kind,
                    error = %error,
                    "Send failed, retracted"
                );
                let _ = self.notice_tx.send(SyncNotice::SendFailed {
                    conversation: self.conversation.clone(),
                    temp_id,
                    text,
                    error: SyncError::SubmitFailed(error),
                });
            }
        }
    }

    fn handle_activate(&mut self) {
        let Some(generation) = self.poll.activate() else {
            return;
        };
        tracing::info!(conversation = %self.conversation, generation, "Conversation active");

        if self.config.enabled {
            let cancel = CancellationToken::new();
            spawn_ticker(
                self.config.interval,
                generation,
                self.event_tx.clone(),
                cancel.clone(),
            );
            self.ticker_cancel = Some(cancel);
        } else {
            self.request_fetch();
        }
    }

    fn handle_deactivate(&mut self) {
        if self.poll.deactivate() {
            tracing::info!(conversation = %self.conversation, "Conversation idle");
        }
        self.stop_ticker();
    }

    /// Fetch unless one is outstanding; ticks use this
    fn request_fetch(&mut self) {
        let Some(ticket) = self.poll.begin_fetch() else {
            tracing::debug!(
                conversation = %self.conversation,
                state = ?self.poll.state(),
                "Skipping fetch"
            );
            return;
        };
        self.spawn_fetch(ticket);
    }

    /// Fetch now, or right after the outstanding fetch. The outstanding one
    /// may have been answered before the server stored what we are waiting
    /// for.
    fn request_follow_up_fetch(&mut self) {
        if let Some(ticket) = self.poll.begin_fetch() {
            self.spawn_fetch(ticket);
        } else if self.poll.defer_fetch() {
            tracing::debug!(
                conversation = %self.conversation,
                "Fetch deferred behind outstanding one"
            );
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let event_tx = self.event_tx.clone();
        let conversation = self.conversation.clone();
        tokio::spawn(async move {
            let result = source.fetch(&conversation).await;
            let _ = event_tx.send(Event::FetchCompleted { ticket, result }).await;
        });
    }

    fn handle_fetch_completed(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Message>, ClientError>,
    ) {
        if !self.poll.finish_fetch(ticket) {
            tracing::debug!(
                conversation = %self.conversation,
                generation = ticket.generation(),
                "Discarding stale fetch"
            );
            return;
        }

        match result {
            Ok(batch) => {
                let outcome = reconcile(&mut self.store, SyncEvent::PollBatch { messages: batch });
                if outcome.changed() {
                    tracing::debug!(
                        conversation = %self.conversation,
                        appended = outcome.appended.len(),
                        promoted = outcome.promoted.len(),
                        "Merged poll batch"
                    );
                    self.publish();
                }
            }
            Err(error) => {
                // The next tick retries
                let transient = error.kind.is_transient();
                tracing::warn!(
                    conversation = %self.conversation,
                    transient,
                    error = %SyncError::FetchFailed(error),
                    "Fetch failed"
                );
            }
        }

        if self.poll.take_refetch() {
            self.request_fetch();
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.store.messages().to_vec());
    }

    fn stop_ticker(&mut self) {
        if let Some(cancel) = self.ticker_cancel.take() {
            cancel.cancel();
        }
    }
}
