mod render;
pub mod schedule;
mod scheduler;

pub use render::{
    RenderError, TimeTag, empty_message, event_message, header_message, humanize_seconds,
};
pub use schedule::{Phase, SchedulePolicy, ScheduleSnapshot, ScheduleStatus, next_target};
pub use scheduler::{EmojiCache, Notifier};

use crate::error::NotifyError;
use crate::ports::{ChatBackend, TrackedMembers, ZwiftBackend};
use crate::signups;
use crate::state::AppState;
use crate::types::chat::{Emoji, OutgoingMessage};
use crate::zwift::{EventLink, normalize};

use tracing::debug;

/// Fetches an event with its roster and renders the embed for it, keeping
/// only tracked riders and team members in the roster.
pub async fn prepare_event_message<Z, C, M>(
    state: &AppState<Z, C, M>,
    link: &EventLink,
    tracked: &[u64],
    emojis: &[Emoji],
) -> Result<OutgoingMessage, NotifyError>
where
    Z: ZwiftBackend,
    C: ChatBackend,
    M: TrackedMembers,
{
    let raw = state.zwift.get_event(link.id, link.secret.as_deref()).await?;
    let event = normalize(raw);
    let roster = state.zwift.race_signups(link.id).await?;
    let roster = signups::tracked_roster(roster, tracked, state.settings.team_id);
    debug!(event_id = link.id, riders = roster.len(), "rendering event");
    Ok(event_message(&event, &roster, emojis, &state.reference)?)
}
