use crate::config::ZwiftConfig;
use crate::error::FetchError;
use crate::identity::filter_roster;
use crate::ports;
use crate::types::rider::{ProfileSignup, RaceSignup, RiderProfile, RiderSummary};
use crate::zwift::RawRecord;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::pin::Pin;
use time::OffsetDateTime;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("bakpdl/", env!("CARGO_PKG_VERSION"));

/// Client for the public event API and the results platform's cached JSON.
#[derive(Clone)]
pub struct ZwiftHttpClient {
    http: reqwest::Client,
    config: ZwiftConfig,
    team_id: u64,
}

impl ZwiftHttpClient {
    pub fn new(config: ZwiftConfig, team_id: u64) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| FetchError::Transport {
                url: config.api_url.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            config,
            team_id,
        })
    }

    fn zwiftpower(&self, path: &str) -> String {
        format!("{}/{}", self.config.zwiftpower_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
        with_cookie: bool,
    ) -> Result<T, FetchError> {
        debug!(url = %url, "fetching");
        let mut request = self.http.get(&url).query(query);
        if with_cookie && let Some(cookie) = self.config.zwiftpower_cookie.as_deref() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        let response = request.send().await.map_err(|err| FetchError::Transport {
            url: url.clone(),
            message: err.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response.json().await.map_err(|err| FetchError::Decode {
            url,
            message: err.to_string(),
        })
    }
}

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

impl ports::EventSource for ZwiftHttpClient {
    type EventFut<'a>
        = BoxFut<'a, RawRecord>
    where
        Self: 'a;

    fn get_event<'a>(&'a self, id: u64, secret: Option<&'a str>) -> Self::EventFut<'a> {
        Box::pin(async move {
            let url = format!(
                "{}/api/public/events/{id}",
                self.config.api_url.trim_end_matches('/')
            );
            let query: Vec<(&str, &str)> = secret.map(|s| ("eventSecret", s)).into_iter().collect();
            self.get_json(url, &query, false).await
        })
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SignupEntry {
    #[serde(deserialize_with = "flexible_u64")]
    zid: u64,
    #[serde(deserialize_with = "flexible_i64")]
    tm: i64,
}

#[derive(Debug, Deserialize)]
struct RaceEntry {
    #[serde(deserialize_with = "flexible_u64")]
    zwid: u64,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "optional_u64")]
    tid: Option<u64>,
    #[serde(default)]
    category: String,
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    #[serde(deserialize_with = "flexible_u64")]
    zwid: u64,
    #[serde(default)]
    name: String,
}

impl ports::ProfileSource for ZwiftHttpClient {
    type ProfileFut<'a>
        = BoxFut<'a, RiderProfile>
    where
        Self: 'a;

    fn profile<'a>(&'a self, rider_id: u64) -> Self::ProfileFut<'a> {
        Box::pin(async move {
            let all: DataEnvelope<ProfileEntry> = self
                .get_json(self.zwiftpower(&format!("cache3/profile/{rider_id}_all.json")), &[], true)
                .await?;
            let signups: DataEnvelope<SignupEntry> = self
                .get_json(
                    self.zwiftpower(&format!("cache3/profile/{rider_id}_signups.json")),
                    &[],
                    true,
                )
                .await?;

            let name = all
                .data
                .into_iter()
                .map(|entry| entry.name)
                .find(|name| !name.is_empty())
                .unwrap_or_default();
            let signups = signups
                .data
                .into_iter()
                .filter_map(|entry| match OffsetDateTime::from_unix_timestamp(entry.tm) {
                    Ok(start) => Some(ProfileSignup {
                        event_id: entry.zid,
                        start,
                    }),
                    Err(_) => {
                        warn!(rider_id, event_id = entry.zid, tm = entry.tm, "signup with invalid start");
                        None
                    }
                })
                .collect();
            Ok(RiderProfile {
                id: rider_id,
                name,
                signups,
            })
        })
    }
}

impl ports::RaceRoster for ZwiftHttpClient {
    type RosterFut<'a>
        = BoxFut<'a, Vec<RaceSignup>>
    where
        Self: 'a;

    fn race_signups<'a>(&'a self, event_id: u64) -> Self::RosterFut<'a> {
        Box::pin(async move {
            let roster: DataEnvelope<RaceEntry> = self
                .get_json(
                    self.zwiftpower(&format!("cache3/results/{event_id}_signups.json")),
                    &[],
                    true,
                )
                .await?;
            Ok(roster
                .data
                .into_iter()
                .map(|entry| RaceSignup {
                    id: entry.zwid,
                    name: entry.name,
                    team_id: entry.tid,
                    category: entry.category,
                })
                .collect())
        })
    }
}

impl ports::RosterSearch for ZwiftHttpClient {
    type SearchFut<'a>
        = BoxFut<'a, Vec<RiderSummary>>
    where
        Self: 'a;

    fn find_team_member<'a>(&'a self, query: &'a str) -> Self::SearchFut<'a> {
        Box::pin(async move {
            let team_id = self.team_id.to_string();
            let team: DataEnvelope<TeamEntry> = self
                .get_json(
                    self.zwiftpower("api3.php"),
                    &[("do", "team_riders"), ("id", team_id.as_str())],
                    true,
                )
                .await?;
            let riders: Vec<RiderSummary> = team
                .data
                .into_iter()
                .map(|entry| RiderSummary {
                    id: entry.zwid,
                    name: entry.name,
                })
                .collect();
            Ok(filter_roster(&riders, query))
        })
    }
}

/// The results platform mixes numbers and numeric strings for ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flexible {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Flexible {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            Self::Float(_) => None,
            Self::Text(value) => value.trim().parse().ok(),
        }
    }
}

fn flexible_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Flexible::deserialize(deserializer)?;
    value
        .as_i64()
        .ok_or_else(|| serde::de::Error::custom("expected an integer or numeric string"))
}

fn flexible_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = flexible_i64(deserializer)?;
    u64::try_from(value).map_err(|_| serde::de::Error::custom("expected a non-negative id"))
}

fn optional_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Flexible>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| value.as_i64())
        .and_then(|value| u64::try_from(value).ok())
        .filter(|&value| value != 0))
}
