use crate::error::FetchError;
use crate::types::rider::{RaceSignup, RiderProfile, RiderSummary};
use crate::zwift::RawRecord;

/// Event detail lookups on the event platform.
pub trait EventSource: Clone + Send + Sync + 'static {
    type EventFut<'a>: Future<Output = Result<RawRecord, FetchError>> + Send + 'a
    where
        Self: 'a;

    fn get_event<'a>(&'a self, id: u64, secret: Option<&'a str>) -> Self::EventFut<'a>;
}

/// Rider profiles, including their pending signups.
pub trait ProfileSource: Clone + Send + Sync + 'static {
    type ProfileFut<'a>: Future<Output = Result<RiderProfile, FetchError>> + Send + 'a
    where
        Self: 'a;

    fn profile<'a>(&'a self, rider_id: u64) -> Self::ProfileFut<'a>;
}

/// The full signup roster of one event.
pub trait RaceRoster: Clone + Send + Sync + 'static {
    type RosterFut<'a>: Future<Output = Result<Vec<RaceSignup>, FetchError>> + Send + 'a
    where
        Self: 'a;

    fn race_signups<'a>(&'a self, event_id: u64) -> Self::RosterFut<'a>;
}

/// Name search over the designated team's riders.
pub trait RosterSearch: Clone + Send + Sync + 'static {
    type SearchFut<'a>: Future<Output = Result<Vec<RiderSummary>, FetchError>> + Send + 'a
    where
        Self: 'a;

    fn find_team_member<'a>(&'a self, query: &'a str) -> Self::SearchFut<'a>;
}
