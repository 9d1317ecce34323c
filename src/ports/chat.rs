use crate::error::ChatError;
use crate::types::chat::{Emoji, Member, OutgoingMessage};

pub trait ChatSender: Clone + Send + Sync + 'static {
    type SendFut<'a>: Future<Output = Result<(), ChatError>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, message: &'a OutgoingMessage) -> Self::SendFut<'a>;
}

pub trait EmojiSource: Clone + Send + Sync + 'static {
    type EmojiFut<'a>: Future<Output = Result<Vec<Emoji>, ChatError>> + Send + 'a
    where
        Self: 'a;

    fn emojis<'a>(&'a self) -> Self::EmojiFut<'a>;
}

/// Resolves a free-form reference (mention, id, name) to a chat member.
pub trait NameDirectory: Clone + Send + Sync + 'static {
    type MemberFut<'a>: Future<Output = Result<Option<Member>, ChatError>> + Send + 'a
    where
        Self: 'a;

    fn convert<'a>(&'a self, query: &'a str) -> Self::MemberFut<'a>;
}
