use super::render;
use super::schedule::{compute_delay, next_target};
use crate::error::{ChatError, NotifyError};
use crate::ports::{ChatBackend, EmojiSource, TimeProvider, TrackedMembers, ZwiftBackend};
use crate::signups;
use crate::state::AppState;
use crate::types::chat::Emoji;
use crate::zwift::EventLink;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;
use time::Duration;
use tracing::{debug, error, info, warn};

/// Guild emojis, fetched on first use and kept for the process lifetime.
///
/// Two concurrent first fetches both write the same data; the first write
/// wins and the second is dropped.
#[derive(Debug, Default)]
pub struct EmojiCache {
    emojis: OnceLock<Vec<Emoji>>,
}

impl EmojiCache {
    pub async fn get_or_fetch<E: EmojiSource>(&self, source: &E) -> Result<&[Emoji], ChatError> {
        if let Some(emojis) = self.emojis.get() {
            return Ok(emojis);
        }
        let fetched = source.emojis().await?;
        let _ = self.emojis.set(fetched);
        Ok(self.emojis.get().map(Vec::as_slice).unwrap_or_default())
    }

    /// Cached emojis, or none when fetching fails.
    pub async fn get_or_empty<E: EmojiSource>(&self, source: &E) -> &[Emoji] {
        match self.get_or_fetch(source).await {
            Ok(emojis) => emojis,
            Err(err) => {
                warn!(error = %err, "failed to fetch guild emojis");
                &[]
            }
        }
    }
}

/// Daily signup check: wait for the next target, fire, repeat.
pub struct Notifier<T, Z, C, M> {
    time: T,
    state: AppState<Z, C, M>,
}

impl<T, Z, C, M> Notifier<T, Z, C, M>
where
    T: TimeProvider,
    Z: ZwiftBackend,
    C: ChatBackend,
    M: TrackedMembers,
{
    pub fn new(time: T, state: AppState<Z, C, M>) -> Self {
        Self { time, state }
    }

    pub async fn run(self) {
        loop {
            self.cycle().await.ok();
        }
    }

    /// One Waiting -> Firing -> Waiting round. Failures and panics inside the
    /// firing are logged and end the round normally.
    pub(crate) async fn cycle(&self) -> Result<usize, NotifyError> {
        let now = self.time.now();
        let target = next_target(now, &self.state.settings.policy);
        self.state.schedule.waiting(target);
        if let Some(delay) = compute_delay(now, target) {
            debug!(seconds = delay.as_secs(), %target, "scheduling signup check");
            self.time.sleep(delay).await;
        }

        self.state.schedule.firing();
        let outcome = match AssertUnwindSafe(self.fire()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(NotifyError::Panicked(panic_message(panic.as_ref()))),
        };
        match &outcome {
            Ok(count) => info!(events = count, "signup check done"),
            Err(err) => error!(error = %err, "signup check failed"),
        }
        self.state.schedule.fired(
            self.time.now(),
            outcome.as_ref().err().map(ToString::to_string),
        );
        outcome
    }

    async fn fire(&self) -> Result<usize, NotifyError> {
        let state = &self.state;
        let emojis = state.emojis.get_or_empty(&state.chat).await;
        let tracked = state.members.load()?;
        let events = signups::aggregate(
            &state.zwift,
            &tracked,
            self.time.now(),
            Duration::hours(state.settings.lookahead_hours),
        )
        .await?;
        info!(tracked = tracked.len(), events = events.len(), "aggregated signups");

        let header = render::header_message(&state.settings.community, state.settings.lookahead_hours)?;
        state.chat.send(&header).await?;
        if events.is_empty() {
            state.chat.send(&render::empty_message()?).await?;
            return Ok(0);
        }

        for &event_id in &events {
            let link = EventLink {
                id: event_id,
                secret: None,
            };
            let message = super::prepare_event_message(state, &link, &tracked, emojis).await?;
            state.chat.send(&message).await?;
        }
        Ok(events.len())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
