use std::time::Duration;

use time::OffsetDateTime;

use crate::ports;

mod discord;
mod store;
mod zwift;

pub use discord::DiscordClient;
pub use store::CsvMemberStore;
pub use zwift::ZwiftHttpClient;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}
