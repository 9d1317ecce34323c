//! Which upcoming events do tracked riders have signups for.

use crate::error::FetchError;
use crate::ports::ProfileSource;
use crate::types::rider::{RaceSignup, Signup};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

/// Signups of one rider starting strictly inside `now .. now + lookahead`.
pub async fn upcoming_signups<P: ProfileSource>(
    profiles: &P,
    rider_id: u64,
    now: OffsetDateTime,
    lookahead: Duration,
) -> Result<Vec<Signup>, FetchError> {
    let horizon = now + lookahead;
    let profile = profiles.profile(rider_id).await?;
    Ok(profile
        .signups
        .into_iter()
        .filter(|signup| signup.start > now && signup.start < horizon)
        .map(|signup| Signup {
            rider_id,
            event_id: signup.event_id,
            start: signup.start,
        })
        .collect())
}

/// Event ids the tracked riders are signed up for within the window,
/// deduplicated and ordered by start.
///
/// The first signup seen for an event decides its start. A fetch failure for
/// any rider aborts the whole pass.
pub async fn aggregate<P: ProfileSource>(
    profiles: &P,
    tracked_ids: &[u64],
    now: OffsetDateTime,
    lookahead: Duration,
) -> Result<Vec<u64>, FetchError> {
    let mut events: HashMap<u64, OffsetDateTime> = HashMap::new();
    for &rider_id in tracked_ids {
        let signups = upcoming_signups(profiles, rider_id, now, lookahead).await?;
        debug!(rider_id, count = signups.len(), "upcoming signups");
        for signup in signups {
            match events.entry(signup.event_id) {
                Entry::Vacant(entry) => {
                    entry.insert(signup.start);
                }
                Entry::Occupied(entry) => {
                    if *entry.get() != signup.start {
                        warn!(
                            event_id = signup.event_id,
                            rider_id,
                            "signup start differs from earlier signup for the same event"
                        );
                    }
                }
            }
        }
    }

    let mut ordered: Vec<(u64, OffsetDateTime)> = events.into_iter().collect();
    ordered.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    Ok(ordered.into_iter().map(|(event_id, _)| event_id).collect())
}

/// Roster entries worth showing: tracked riders and members of the team.
pub fn tracked_roster(roster: Vec<RaceSignup>, tracked_ids: &[u64], team_id: u64) -> Vec<RaceSignup> {
    roster
        .into_iter()
        .filter(|rider| rider.team_id == Some(team_id) || tracked_ids.contains(&rider.id))
        .collect()
}
