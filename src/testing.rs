//! In-memory port implementations shared by the unit tests.

use crate::config::NotifySettings;
use crate::error::{ChatError, FetchError, StoreError};
use crate::identity::{filter_roster, match_member};
use crate::notify::{EmojiCache, SchedulePolicy, ScheduleStatus};
use crate::ports::{
    ChatSender, EmojiSource, EventSource, NameDirectory, ProfileSource, RaceRoster, RosterSearch,
    TimeProvider, TrackedMembers,
};
use crate::state::AppState;
use crate::types::chat::{Emoji, Member, OutgoingMessage};
use crate::types::rider::{RaceSignup, RiderProfile, RiderSummary};
use crate::zwift::{RawRecord, ReferenceTable};

use serde_json::Value;
use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::offset;

#[derive(Default)]
struct ZwiftData {
    profiles: HashMap<u64, RiderProfile>,
    events: HashMap<u64, RawRecord>,
    rosters: HashMap<u64, Vec<RaceSignup>>,
    team: Vec<RiderSummary>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeZwift {
    data: Arc<Mutex<ZwiftData>>,
    failing_profiles: Arc<AtomicUsize>,
    searches: Arc<AtomicUsize>,
}

impl FakeZwift {
    pub(crate) fn with_profile(self, profile: RiderProfile) -> Self {
        self.data
            .lock()
            .expect("zwift data lock")
            .profiles
            .insert(profile.id, profile);
        self
    }

    pub(crate) fn with_team(self, team: Vec<RiderSummary>) -> Self {
        self.data.lock().expect("zwift data lock").team = team;
        self
    }

    pub(crate) fn with_event(self, id: u64, event: Value) -> Self {
        if let Value::Object(record) = event {
            self.data
                .lock()
                .expect("zwift data lock")
                .events
                .insert(id, record);
        }
        self
    }

    pub(crate) fn with_roster(self, event_id: u64, roster: Vec<RaceSignup>) -> Self {
        self.data
            .lock()
            .expect("zwift data lock")
            .rosters
            .insert(event_id, roster);
        self
    }

    /// The next `count` profile fetches answer with a 503.
    pub(crate) fn fail_next_profiles(&self, count: usize) {
        self.failing_profiles.store(count, Ordering::SeqCst);
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl EventSource for FakeZwift {
    type EventFut<'a>
        = Ready<Result<RawRecord, FetchError>>
    where
        Self: 'a;

    fn get_event<'a>(&'a self, id: u64, _secret: Option<&'a str>) -> Self::EventFut<'a> {
        let data = self.data.lock().expect("zwift data lock");
        ready(data.events.get(&id).cloned().ok_or(FetchError::Status {
            url: format!("fake://events/{id}"),
            status: 404,
        }))
    }
}

impl ProfileSource for FakeZwift {
    type ProfileFut<'a>
        = Ready<Result<RiderProfile, FetchError>>
    where
        Self: 'a;

    fn profile<'a>(&'a self, rider_id: u64) -> Self::ProfileFut<'a> {
        let url = format!("fake://profiles/{rider_id}");
        let failing = self
            .failing_profiles
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return ready(Err(FetchError::Status { url, status: 503 }));
        }
        let data = self.data.lock().expect("zwift data lock");
        ready(
            data.profiles
                .get(&rider_id)
                .cloned()
                .ok_or(FetchError::Status { url, status: 404 }),
        )
    }
}

impl RaceRoster for FakeZwift {
    type RosterFut<'a>
        = Ready<Result<Vec<RaceSignup>, FetchError>>
    where
        Self: 'a;

    fn race_signups<'a>(&'a self, event_id: u64) -> Self::RosterFut<'a> {
        let data = self.data.lock().expect("zwift data lock");
        ready(Ok(data.rosters.get(&event_id).cloned().unwrap_or_default()))
    }
}

impl RosterSearch for FakeZwift {
    type SearchFut<'a>
        = Ready<Result<Vec<RiderSummary>, FetchError>>
    where
        Self: 'a;

    fn find_team_member<'a>(&'a self, query: &'a str) -> Self::SearchFut<'a> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().expect("zwift data lock");
        ready(Ok(filter_roster(&data.team, query)))
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeChat {
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    emojis: Arc<Vec<Emoji>>,
    members: Arc<Vec<Member>>,
    emoji_calls: Arc<AtomicUsize>,
    fail_emojis: Arc<AtomicBool>,
    panic_send: Arc<AtomicBool>,
}

impl FakeChat {
    pub(crate) fn with_emojis(mut self, emojis: Vec<Emoji>) -> Self {
        self.emojis = Arc::new(emojis);
        self
    }

    pub(crate) fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = Arc::new(members);
        self
    }

    pub(crate) fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn emoji_calls(&self) -> usize {
        self.emoji_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_emojis(&self) {
        self.fail_emojis.store(true, Ordering::SeqCst);
    }

    pub(crate) fn panic_next_send(&self) {
        self.panic_send.store(true, Ordering::SeqCst);
    }
}

impl ChatSender for FakeChat {
    type SendFut<'a>
        = Ready<Result<(), ChatError>>
    where
        Self: 'a;

    fn send<'a>(&'a self, message: &'a OutgoingMessage) -> Self::SendFut<'a> {
        if self.panic_send.swap(false, Ordering::SeqCst) {
            panic!("chat connection dropped");
        }
        self.sent.lock().expect("sent lock").push(message.clone());
        ready(Ok(()))
    }
}

impl EmojiSource for FakeChat {
    type EmojiFut<'a>
        = Ready<Result<Vec<Emoji>, ChatError>>
    where
        Self: 'a;

    fn emojis<'a>(&'a self) -> Self::EmojiFut<'a> {
        self.emoji_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_emojis.swap(false, Ordering::SeqCst) {
            return ready(Err(ChatError::Status(500)));
        }
        ready(Ok(self.emojis.as_ref().clone()))
    }
}

impl NameDirectory for FakeChat {
    type MemberFut<'a>
        = Ready<Result<Option<Member>, ChatError>>
    where
        Self: 'a;

    fn convert<'a>(&'a self, query: &'a str) -> Self::MemberFut<'a> {
        ready(Ok(match_member(&self.members, query).cloned()))
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeMembers {
    ids: Arc<Vec<u64>>,
}

impl FakeMembers {
    pub(crate) fn new(ids: Vec<u64>) -> Self {
        Self { ids: Arc::new(ids) }
    }
}

impl TrackedMembers for FakeMembers {
    fn load(&self) -> Result<Vec<u64>, StoreError> {
        Ok(self.ids.as_ref().clone())
    }
}

/// Clock whose sleeps complete at once and move the clock forward.
#[derive(Clone)]
pub(crate) struct TestTime {
    now: Arc<Mutex<OffsetDateTime>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    pub(crate) fn now_value(&self) -> OffsetDateTime {
        *self.now.lock().expect("now lock")
    }
}

impl TimeProvider for TestTime {
    type Sleep<'a>
        = Ready<()>
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.now_value()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        *self.now.lock().expect("now lock") += duration;
        ready(())
    }
}

pub(crate) fn test_settings() -> NotifySettings {
    NotifySettings {
        policy: SchedulePolicy::new(offset!(+1)),
        lookahead_hours: 4,
        team_id: 13264,
        community: "Backpedal".to_string(),
    }
}

pub(crate) fn test_state(
    zwift: FakeZwift,
    chat: FakeChat,
    members: FakeMembers,
) -> AppState<FakeZwift, FakeChat, FakeMembers> {
    AppState {
        zwift,
        chat,
        members,
        reference: Arc::new(ReferenceTable::bundled().expect("reference")),
        emojis: Arc::new(EmojiCache::default()),
        schedule: Arc::new(ScheduleStatus::default()),
        settings: test_settings(),
    }
}
