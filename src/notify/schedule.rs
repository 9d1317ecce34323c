use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::macros::time;
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, Weekday};

/// When the daily signup check fires, in the community's reference zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePolicy {
    pub weekday_at: Time,
    pub weekend_at: Time,
    pub offset: UtcOffset,
}

impl SchedulePolicy {
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            weekday_at: time!(18:00),
            weekend_at: time!(08:00),
            offset,
        }
    }

    fn time_on(&self, weekday: Weekday) -> Time {
        match weekday {
            Weekday::Saturday | Weekday::Sunday => self.weekend_at,
            _ => self.weekday_at,
        }
    }
}

/// Today's fire time if it is still ahead, tomorrow's otherwise.
pub fn next_target(now: OffsetDateTime, policy: &SchedulePolicy) -> OffsetDateTime {
    let local = now.to_offset(policy.offset);
    let date = local.date();
    let today = PrimitiveDateTime::new(date, policy.time_on(date.weekday()))
        .assume_offset(policy.offset);
    if today > local {
        return today;
    }

    let tomorrow = (local + time::Duration::days(1)).date();
    PrimitiveDateTime::new(tomorrow, policy.time_on(tomorrow.weekday())).assume_offset(policy.offset)
}

pub(crate) fn compute_delay(now: OffsetDateTime, at: OffsetDateTime) -> Option<Duration> {
    let delay = at - now;
    if delay.is_positive() {
        match delay.try_into() {
            Ok(std_delay) => Some(std_delay),
            Err(_) => Some(Duration::MAX),
        }
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Starting,
    Waiting,
    Firing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    pub phase: Phase,
    pub target: Option<OffsetDateTime>,
    pub last_fired: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub cycles: u64,
}

/// Scheduler state shared with the diagnostic surface.
#[derive(Debug)]
pub struct ScheduleStatus {
    inner: Mutex<ScheduleSnapshot>,
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        Self {
            inner: Mutex::new(ScheduleSnapshot {
                phase: Phase::Starting,
                target: None,
                last_fired: None,
                last_error: None,
                cycles: 0,
            }),
        }
    }
}

impl ScheduleStatus {
    pub fn snapshot(&self) -> ScheduleSnapshot {
        self.inner.lock().expect("schedule status lock").clone()
    }

    pub(crate) fn waiting(&self, target: OffsetDateTime) {
        let mut inner = self.inner.lock().expect("schedule status lock");
        inner.phase = Phase::Waiting;
        inner.target = Some(target);
    }

    pub(crate) fn firing(&self) {
        self.inner.lock().expect("schedule status lock").phase = Phase::Firing;
    }

    pub(crate) fn fired(&self, at: OffsetDateTime, error: Option<String>) {
        let mut inner = self.inner.lock().expect("schedule status lock");
        inner.phase = Phase::Waiting;
        inner.last_fired = Some(at);
        inner.last_error = error;
        inner.cycles += 1;
    }

    /// Human-readable "time until next check" line.
    pub fn describe(&self, now: OffsetDateTime) -> String {
        let snapshot = self.snapshot();
        match snapshot.target {
            Some(target) => {
                let formatted = target
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| target.to_string());
                let remaining = (target - now).whole_seconds().max(0);
                format!(
                    "next signup check at {formatted} (in {})",
                    super::render::humanize_seconds(remaining as u64)
                )
            }
            None => "next signup check not scheduled yet".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn policy() -> SchedulePolicy {
        SchedulePolicy::new(offset!(+1))
    }

    #[test]
    fn next_target__should_move_to_next_weekday_evening() {
        // Given tuesday 19:00
        let now = datetime!(2025-01-14 19:00 +1);

        // Then
        assert_eq!(next_target(now, &policy()), datetime!(2025-01-15 18:00 +1));
    }

    #[test]
    fn next_target__should_use_weekend_morning_after_friday() {
        // Given friday 19:00
        let now = datetime!(2025-01-17 19:00 +1);

        // Then
        assert_eq!(next_target(now, &policy()), datetime!(2025-01-18 08:00 +1));
    }

    #[test]
    fn next_target__should_keep_today_when_not_passed() {
        // Given monday 06:00
        let now = datetime!(2025-01-13 06:00 +1);

        // Then
        assert_eq!(next_target(now, &policy()), datetime!(2025-01-13 18:00 +1));
    }

    #[test]
    fn next_target__should_cover_weekend_transitions() {
        // Then saturday 09:00 -> sunday 08:00, sunday 09:00 -> monday 18:00
        assert_eq!(
            next_target(datetime!(2025-01-18 09:00 +1), &policy()),
            datetime!(2025-01-19 08:00 +1)
        );
        assert_eq!(
            next_target(datetime!(2025-01-19 09:00 +1), &policy()),
            datetime!(2025-01-20 18:00 +1)
        );
    }

    #[test]
    fn next_target__should_treat_exact_target_as_passed() {
        // Given wednesday 18:00 exactly
        let now = datetime!(2025-01-15 18:00 +1);

        // Then
        assert_eq!(next_target(now, &policy()), datetime!(2025-01-16 18:00 +1));
    }

    #[test]
    fn next_target__should_use_reference_zone_for_weekday() {
        // Given friday 23:30 UTC is already saturday 00:30 in +01:00
        let now = datetime!(2025-01-17 23:30 UTC);

        // Then
        assert_eq!(next_target(now, &policy()), datetime!(2025-01-18 08:00 +1));
    }

    #[test]
    fn compute_delay__should_return_none_for_past_and_now() {
        // Given
        let now = datetime!(2025-01-12 09:30 UTC);

        // Then
        assert!(compute_delay(now, now - time::Duration::seconds(5)).is_none());
        assert!(compute_delay(now, now).is_none());
        assert_eq!(
            compute_delay(now, now + time::Duration::milliseconds(1500)),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn status__should_describe_time_until_target() {
        // Given
        let status = ScheduleStatus::default();
        let now = datetime!(2025-01-14 16:30 +1);

        // When
        let before = status.describe(now);
        status.waiting(datetime!(2025-01-14 18:00 +1));

        // Then
        assert_eq!(before, "next signup check not scheduled yet");
        assert_eq!(
            status.describe(now),
            "next signup check at 2025-01-14T18:00:00+01:00 (in 1 hour, 30 minutes)"
        );
        assert_eq!(status.snapshot().phase, Phase::Waiting);
    }
}
