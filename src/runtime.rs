//! Runtime for synchronizing conversation views
//!
//! A view is a `ConversationRuntime` task plus the `ConversationHandle` used
//! to drive it. `SyncManager` opens views, keeps at most one of them alive,
//! and checks membership before a room's feed may be read or written.

mod append;
mod error;
mod executor;
mod membership;
mod poll;
pub mod traits;


pub use error::{SyncError, SyncResult};
pub use executor::ConversationRuntime;
pub use membership::MembershipManager;
pub use poll::{PollConfig, DEFAULT_POLL_INTERVAL};
pub use traits::*;

use crate::feed::{ConversationId, Identity, Message, MentorSession, Room, TempId};
use executor::Event;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::{CancellationToken, DropGuard};

/// User-visible, non-fatal notifications from a view
#[derive(Debug, Clone)]
pub enum SyncNotice {
    /// A send was rejected and its provisional entry removed
    SendFailed {
        conversation: ConversationId,
        temp_id: TempId,
        text: String,
        error: SyncError,
    },
}

/// Handle to an open conversation view.
///
/// Dropping the handle stops the view's runtime and discards its feed; any
/// remote call still in flight completes into a closed channel.
pub struct ConversationHandle {
    conversation: ConversationId,
    event_tx: mpsc::Sender<Event>,
    snapshot_rx: watch::Receiver<Vec<Message>>,
    notice_tx: broadcast::Sender<SyncNotice>,
    _shutdown: DropGuard,
}

impl ConversationHandle {
    /// Spawn a runtime for `conversation`. The view starts idle.
    pub fn spawn<S>(
        conversation: ConversationId,
        identity: Identity,
        config: PollConfig,
        source: Arc<S>,
    ) -> Self
    where
        S: FeedSource + ?Sized + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());
        let (notice_tx, _) = broadcast::channel(32);
        let shutdown = CancellationToken::new();

        let runtime = ConversationRuntime::new(
            conversation.clone(),
            identity,
            config,
            source,
            event_rx,
            event_tx.clone(),
            snapshot_tx,
            notice_tx.clone(),
            shutdown.clone(),
        );
        tokio::spawn(runtime.run());

        Self {
            conversation,
            event_tx,
            snapshot_rx,
            notice_tx,
            _shutdown: shutdown.drop_guard(),
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// Send a message. The optimistic entry is in the feed by the time this
    /// returns; confirmation or retraction follows asynchronously.
    pub async fn send(&self, text: &str) -> SyncResult<TempId> {
        append::validate_text(text)?;
        let (reply, rx) = oneshot::channel();
        self.dispatch(Event::Send {
            text: text.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SyncError::Closed)
    }

    /// Start polling: this conversation is now displayed
    pub async fn activate(&self) -> SyncResult<()> {
        self.dispatch(Event::Activate).await
    }

    /// Stop polling; fetches in flight are discarded when they complete
    pub async fn deactivate(&self) -> SyncResult<()> {
        self.dispatch(Event::Deactivate).await
    }

    /// Fetch once now, or right after the outstanding fetch. Ignored while idle.
    pub async fn refresh(&self) -> SyncResult<()> {
        self.dispatch(Event::Refresh).await
    }

    /// Current feed snapshot
    pub fn messages(&self) -> Vec<Message> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every feed change
    pub fn watch(&self) -> watch::Receiver<Vec<Message>> {
        self.snapshot_rx.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<SyncNotice> {
        self.notice_tx.subscribe()
    }

    async fn dispatch(&self, event: Event) -> SyncResult<()> {
        self.event_tx.send(event).await.map_err(|_| SyncError::Closed)
    }
}

/// Entry point for the conversational core.
///
/// Owns the membership state and the single active view. Opening a
/// conversation closes the previously open one.
pub struct SyncManager {
    identity: Identity,
    membership: MembershipManager,
    room_feed: Arc<dyn FeedSource>,
    mentor_feed: Arc<dyn FeedSource>,
    config: PollConfig,
    open: Option<ConversationHandle>,
}

impl SyncManager {
    pub fn new(
        identity: Identity,
        directory: Arc<dyn RoomDirectory>,
        room_feed: Arc<dyn FeedSource>,
        mentor_feed: Arc<dyn FeedSource>,
        config: PollConfig,
    ) -> Self {
        Self {
            membership: MembershipManager::new(directory, identity.id.clone()),
            identity,
            room_feed,
            mentor_feed,
            config,
            open: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn membership(&self) -> &MembershipManager {
        &self.membership
    }

    pub async fn list_rooms(&mut self) -> SyncResult<&[Room]> {
        self.membership.list_rooms().await
    }

    pub async fn create_room(&mut self, topic: &str) -> SyncResult<Room> {
        self.membership.create_room(topic).await
    }

    pub async fn join_room(&mut self, room_id: &str) -> SyncResult<bool> {
        self.membership.join_room(room_id).await
    }

    /// Open and activate a room's feed. The caller must have joined it.
    pub async fn open_room(&mut self, room_id: &str) -> SyncResult<&ConversationHandle> {
        self.membership.require_member(room_id)?;
        let source = Arc::clone(&self.room_feed);
        self.open_view(ConversationId::room(room_id), source).await
    }

    /// Open and activate a mentor session. Only its owner may open it.
    pub async fn open_mentor(&mut self, session: &MentorSession) -> SyncResult<&ConversationHandle> {
        if session.owner_id != self.identity.id {
            return Err(SyncError::MembershipRequired(session.conversation_id()));
        }
        let source = Arc::clone(&self.mentor_feed);
        self.open_view(session.conversation_id(), source).await
    }

    pub fn active(&self) -> Option<&ConversationHandle> {
        self.open.as_ref()
    }

    /// Send on the open view of `conversation`
    pub async fn send(&self, conversation: &ConversationId, text: &str) -> SyncResult<TempId> {
        if let ConversationId::Room(room_id) = conversation {
            self.membership.require_member(room_id)?;
        }
        match &self.open {
            Some(handle) if handle.conversation() == conversation => handle.send(text).await,
            _ => Err(SyncError::NotOpen(conversation.clone())),
        }
    }

    /// Close the open view, dropping its feed
    pub fn close(&mut self) {
        if let Some(handle) = self.open.take() {
            tracing::info!(conversation = %handle.conversation(), "Closing view");
        }
    }

    async fn open_view(
        &mut self,
        conversation: ConversationId,
        source: Arc<dyn FeedSource>,
    ) -> SyncResult<&ConversationHandle> {
        self.close();
        let handle =
            ConversationHandle::spawn(conversation, self.identity.clone(), self.config, source);
        handle.activate().await?;
        Ok(self.open.insert(handle))
    }
}
