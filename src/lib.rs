pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod notify;
pub mod ports;
pub mod signups;
pub mod state;
mod templates;
pub mod types;
pub mod zwift;

#[cfg(test)]
mod testing;

use crate::adapters::{CsvMemberStore, DiscordClient, TokioTimeProvider, ZwiftHttpClient};
use crate::error::{ChatError, FetchError, NotifyError};
use crate::notify::{EmojiCache, Notifier, ScheduleStatus};
use crate::ports::TrackedMembers;
use crate::state::AppState;
use crate::types::chat::OutgoingMessage;
use crate::zwift::reference::ReferenceError;
use crate::zwift::{ReferenceTable, parse_event_reference};

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
    #[error("'{0}' is neither an event id nor an event link")]
    InvalidEvent(String),
}

pub type LiveState = AppState<ZwiftHttpClient, DiscordClient, CsvMemberStore>;

pub fn build_state(config: &config::AppConfig) -> Result<LiveState, StartupError> {
    let reference = match config.reference.as_deref() {
        Some(path) => ReferenceTable::load(path)?,
        None => ReferenceTable::bundled()?,
    };
    Ok(AppState {
        zwift: ZwiftHttpClient::new(config.zwift.clone(), config.notify.team_id)?,
        chat: DiscordClient::new(config.chat.clone())?,
        members: CsvMemberStore::new(&config.tracked_file),
        reference: Arc::new(reference),
        emojis: Arc::new(EmojiCache::default()),
        schedule: Arc::new(ScheduleStatus::default()),
        settings: config.notify.clone(),
    })
}

/// Starts the daily signup check and serves the control surface until the
/// process is stopped.
pub async fn serve(config: config::AppConfig) -> Result<(), StartupError> {
    let state = build_state(&config)?;
    let notifier = Notifier::new(TokioTimeProvider, state.clone());
    tokio::spawn(notifier.run());

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.addr,
            source,
        })?;
    info!(addr = %config.addr, "listening");
    axum::serve(listener, app::app(state))
        .await
        .map_err(StartupError::Serve)
}

/// One-shot id lookup for the command line.
pub async fn lookup(config: &config::AppConfig, queries: &[String]) -> Result<String, StartupError> {
    let state = build_state(config)?;
    let reply = identity::lookup_reply(queries, &state.chat, &state.zwift, &state.zwift).await?;
    Ok(reply)
}

/// Renders the message for one event link or id, as the scheduled check
/// would post it.
pub async fn show_event(
    config: &config::AppConfig,
    input: &str,
) -> Result<OutgoingMessage, StartupError> {
    let link =
        parse_event_reference(input).ok_or_else(|| StartupError::InvalidEvent(input.to_string()))?;
    let state = build_state(config)?;
    let tracked = state.members.load().map_err(NotifyError::from)?;
    let emojis = state.emojis.get_or_empty(&state.chat).await;
    let message = notify::prepare_event_message(&state, &link, &tracked, emojis).await?;
    Ok(message)
}
