pub mod chat;
pub mod store;
pub mod time;
pub mod zwift;

pub use chat::{ChatSender, EmojiSource, NameDirectory};
pub use store::TrackedMembers;
pub use self::time::TimeProvider;
pub use zwift::{EventSource, ProfileSource, RaceRoster, RosterSearch};

/// Everything the bot reads from the event and results platforms.
pub trait ZwiftBackend: EventSource + ProfileSource + RaceRoster + RosterSearch {}

impl<T> ZwiftBackend for T where T: EventSource + ProfileSource + RaceRoster + RosterSearch {}

/// Everything the bot needs from the chat platform.
pub trait ChatBackend: ChatSender + EmojiSource + NameDirectory {}

impl<T> ChatBackend for T where T: ChatSender + EmojiSource + NameDirectory {}
