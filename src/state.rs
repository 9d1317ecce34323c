use crate::config::NotifySettings;
use crate::notify::{EmojiCache, ScheduleStatus};
use crate::zwift::ReferenceTable;

use std::sync::Arc;

/// Collaborators and shared caches handed to the scheduler and the control
/// surface.
#[derive(Clone)]
pub struct AppState<Z, C, M> {
    pub zwift: Z,
    pub chat: C,
    pub members: M,
    pub reference: Arc<ReferenceTable>,
    pub emojis: Arc<EmojiCache>,
    pub schedule: Arc<ScheduleStatus>,
    pub settings: NotifySettings,
}
