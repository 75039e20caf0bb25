//! StudySync - study rooms and mentor sessions
//!
//! A client core that keeps conversation feeds in sync with the backend:
//! sends show up at once, confirmations and polls reconcile them.

mod cli;
mod client;
mod config;
mod feed;
mod runtime;

use clap::Parser;
use cli::{Cli, Commands};
use client::{ApiClient, LoggingSource, MentorClient, RoomClient};
use config::SyncConfig;
use runtime::{IdentityProvider, SyncManager};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studysync=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.apply(SyncConfig::from_env());
    if config.token.is_none() {
        tracing::warn!("No token configured. Set STUDYSYNC_TOKEN or pass --token.");
    }

    let api = ApiClient::new(&config.api_url, config.token.clone())?;
    let identity = api.current_identity().await?;
    tracing::info!(
        api_url = %config.api_url,
        user = %identity.id,
        poll_interval_ms = %config.poll.interval.as_millis(),
        polling = config.poll.enabled,
        "Signed in"
    );

    let rooms = Arc::new(RoomClient::new(api.clone(), identity.clone()));
    let mentor = Arc::new(MentorClient::new(api, identity.clone()));
    let mut manager = SyncManager::new(
        identity,
        rooms.clone(),
        Arc::new(LoggingSource::new("rooms", rooms)),
        Arc::new(LoggingSource::new("mentor", mentor)),
        config.poll,
    );

    match cli.command {
        Commands::Rooms => cli::list_rooms(&mut manager).await?,
        Commands::Create { topic } => cli::create_room(&mut manager, &topic).await?,
        Commands::Chat { room_id } => cli::chat_in_room(&mut manager, &room_id).await?,
        Commands::Mentor { session } => cli::chat_with_mentor(&mut manager, session).await?,
    }

    manager.close();
    Ok(())
}
