//! Mapping free-form queries (ids, chat mentions, names) to rider ids.

use crate::error::FetchError;
use crate::ports::{NameDirectory, ProfileSource, RosterSearch};
use crate::templates::LookupReplyTemplate;
use crate::types::chat::Member;
use crate::types::rider::RiderSummary;

use askama::Template;
use tracing::{info, warn};

/// More roster matches than this is treated as unresolved.
pub const MAX_CANDIDATES: usize = 5;
/// Commands look up at most this many queries; the rest are ignored.
pub const MAX_QUERIES: usize = 5;

pub const UNRESOLVED_TEXT: &str = "Not found or too many results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Vec<u64>),
    Unresolved,
}

/// Outcome for one query; `query` is the member's display name when the
/// original query named a chat member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub query: String,
    pub resolution: Resolution,
}

pub async fn resolve<D, R>(
    query: &str,
    directory: &D,
    roster: &R,
) -> Result<ResolvedIdentity, FetchError>
where
    D: NameDirectory,
    R: RosterSearch,
{
    info!(query, "looking up rider id");

    if let Ok(id) = query.trim().parse::<u64>() {
        return Ok(ResolvedIdentity {
            query: query.to_string(),
            resolution: Resolution::Found(vec![id]),
        });
    }

    let mut effective = query.to_string();
    match directory.convert(query).await {
        Ok(Some(member)) => {
            info!(query, display_name = member.display_name(), "query is a chat member");
            effective = member.display_name().to_string();
        }
        Ok(None) => {}
        Err(err) => warn!(query, error = %err, "member lookup failed"),
    }

    let matches = roster.find_team_member(&effective).await?;
    let resolution = if (1..=MAX_CANDIDATES).contains(&matches.len()) {
        Resolution::Found(matches.iter().map(|rider| rider.id).collect())
    } else {
        Resolution::Unresolved
    };
    Ok(ResolvedIdentity {
        query: effective,
        resolution,
    })
}

/// Case-insensitive name search over a team roster.
pub fn filter_roster(riders: &[RiderSummary], query: &str) -> Vec<RiderSummary> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    riders
        .iter()
        .filter(|rider| rider.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Member matching in the order chat clients do it: id or mention, then
/// username, then global name, then server nickname.
pub fn match_member<'m>(members: &'m [Member], query: &str) -> Option<&'m Member> {
    let query = query.trim();
    if let Some(id) = mention_id(query) {
        return members.iter().find(|member| member.id == id);
    }
    members
        .iter()
        .find(|member| member.username == query)
        .or_else(|| {
            members
                .iter()
                .find(|member| member.global_name.as_deref() == Some(query))
        })
        .or_else(|| members.iter().find(|member| member.nick.as_deref() == Some(query)))
}

fn mention_id(query: &str) -> Option<u64> {
    let inner = query
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|rest| rest.trim_start_matches('!'));
    match inner {
        Some(id) => id.parse().ok(),
        None if query.len() >= 15 => query.parse().ok(),
        None => None,
    }
}

/// Resolves up to [`MAX_QUERIES`] queries and formats one reply line each,
/// showing `id (name)` for every candidate.
pub async fn lookup_reply<D, R, P>(
    queries: &[String],
    directory: &D,
    roster: &R,
    profiles: &P,
) -> Result<String, FetchError>
where
    D: NameDirectory,
    R: RosterSearch,
    P: ProfileSource,
{
    let mut lines = Vec::new();
    for query in queries.iter().take(MAX_QUERIES) {
        let resolved = resolve(query, directory, roster).await?;
        let answer = match &resolved.resolution {
            Resolution::Found(ids) => {
                let mut names = Vec::with_capacity(ids.len());
                for &id in ids {
                    let profile = profiles.profile(id).await?;
                    names.push(format!("{} ({})", profile.id, profile.name));
                }
                names.join(" / ")
            }
            Resolution::Unresolved => UNRESOLVED_TEXT.to_string(),
        };
        lines.push((resolved.query, answer));
    }

    let reply = LookupReplyTemplate { lines: &lines };
    Ok(reply.render().unwrap_or_else(|err| {
        warn!(error = %err, "failed to render lookup reply");
        lines
            .iter()
            .map(|(query, answer)| format!("{query}: {answer}"))
            .collect::<Vec<_>>()
            .join("\n")
    }).trim().to_string())
}
