use std::time::Duration;

use time::OffsetDateTime;

/// Clock for the signup check loop. `now` is read both to pick the next
/// target and to bound the signup window, so a test clock whose `sleep`
/// advances `now` drives whole cycles without waiting.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;

    /// Resolves once `duration` has passed on this clock.
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}
