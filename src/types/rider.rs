use serde::Serialize;
use time::OffsetDateTime;

/// One pending registration on a rider's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSignup {
    pub event_id: u64,
    pub start: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiderProfile {
    pub id: u64,
    pub name: String,
    pub signups: Vec<ProfileSignup>,
}

/// A rider as listed by roster searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiderSummary {
    pub id: u64,
    pub name: String,
}

/// A signup as seen by the aggregator: who, for which event, starting when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signup {
    pub rider_id: u64,
    pub event_id: u64,
    pub start: OffsetDateTime,
}

/// One entry of an event's signup roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceSignup {
    pub id: u64,
    pub name: String,
    pub team_id: Option<u64>,
    pub category: String,
}
