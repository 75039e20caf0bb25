//! Command line interface for the `studysync` binary.
//!
//! Uses clap derive macros. Flags given on the command line override the
//! `STUDYSYNC_*` environment variables.

use crate::config::SyncConfig;
use crate::feed::{ConversationId, Message, MessageId, MentorSession};
use crate::runtime::{SyncError, SyncManager, SyncNotice};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Study rooms and mentor sessions from the terminal.
#[derive(Parser)]
#[command(name = "studysync", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the backend.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Fetch only on open and after sending, never on a timer.
    #[arg(long, global = true)]
    pub no_poll: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List study rooms, newest first.
    #[command(alias = "ls")]
    Rooms,

    /// Create a study room.
    Create {
        /// What the room is about.
        topic: String,
    },

    /// Join a room and chat in it.
    Chat {
        /// Room id as shown by `rooms`.
        room_id: String,
    },

    /// Talk to the mentor.
    Mentor {
        /// Resume an existing session instead of starting a new one.
        #[arg(long)]
        session: Option<String>,
    },
}

impl Cli {
    /// Layer command line flags over `config`
    pub fn apply(&self, mut config: SyncConfig) -> SyncConfig {
        if let Some(url) = &self.api_url {
            config.api_url.clone_from(url);
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(ms) = self.poll_interval_ms.filter(|ms| *ms > 0) {
            config.poll.interval = Duration::from_millis(ms);
        }
        if self.no_poll {
            config.poll.enabled = false;
        }
        config
    }
}

pub async fn list_rooms(manager: &mut SyncManager) -> Result<(), SyncError> {
    let user_id = manager.identity().id.clone();
    let rooms = manager.list_rooms().await?;
    if rooms.is_empty() {
        println!("No rooms yet. Create one with `studysync create <topic>`.");
    }
    for room in rooms {
        let marker = if room.has_member(&user_id) { "*" } else { " " };
        println!(
            "{marker} {}\t{}\tby {}\t{} member(s)",
            room.id,
            room.topic,
            room.created_by_name,
            room.members().len()
        );
    }
    Ok(())
}

pub async fn create_room(manager: &mut SyncManager, topic: &str) -> Result<(), SyncError> {
    let room = manager.create_room(topic).await?;
    println!("Created {} ({})", room.id, room.topic);
    Ok(())
}

pub async fn chat_in_room(manager: &mut SyncManager, room_id: &str) -> Result<(), SyncError> {
    manager.list_rooms().await?;
    manager.join_room(room_id).await?;
    manager.open_room(room_id).await?;
    if let Some(room) = manager.membership().room(room_id) {
        println!("# {} (/refresh to fetch now, /quit to leave)", room.topic);
    }
    chat(manager, ConversationId::room(room_id)).await
}

pub async fn chat_with_mentor(
    manager: &mut SyncManager,
    session_id: Option<String>,
) -> Result<(), SyncError> {
    let session = match session_id {
        Some(id) => MentorSession::resume(id, manager.identity()),
        None => MentorSession::start(manager.identity()),
    };
    manager.open_mentor(&session).await?;
    println!("# Mentor session {} (/refresh to fetch now, /quit to leave)", session.id);
    chat(manager, session.conversation_id()).await
}

/// Interactive loop over the open view: stdin lines are sent, confirmed
/// messages are printed as they arrive.
async fn chat(manager: &SyncManager, conversation: ConversationId) -> Result<(), SyncError> {
    let handle = manager
        .active()
        .ok_or_else(|| SyncError::NotOpen(conversation.clone()))?;
    let mut feed = handle.watch();
    let mut notices = handle.notices();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed: HashSet<MessageId> = HashSet::new();

    print_new(&feed.borrow_and_update(), &mut printed);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                print_new(&feed.borrow_and_update(), &mut printed);
            }
            notice = notices.recv() => match notice {
                Ok(SyncNotice::SendFailed { text, error, .. }) => {
                    eprintln!("! not sent: {text:?} ({error})");
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                match line.trim() {
                    "/quit" => break,
                    "/refresh" => {
                        if let Err(e) = handle.refresh().await {
                            eprintln!("! {e}");
                        }
                        continue;
                    }
                    _ => {}
                }
                match manager.send(&conversation, &line).await {
                    Ok(_) | Err(SyncError::EmptyMessage) => {}
                    Err(e) => eprintln!("! {e}"),
                }
            }
        }
    }
    Ok(())
}

fn print_new(messages: &[Message], printed: &mut HashSet<MessageId>) {
    for message in messages.iter().filter(|m| !m.is_optimistic()) {
        if printed.insert(message.id.clone()) {
            println!(
                "[{}] {}: {}",
                message.timestamp.format("%H:%M"),
                message.author_name,
                message.text
            );
        }
    }
}
