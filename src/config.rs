use crate::notify::SchedulePolicy;

use std::net::SocketAddr;
use std::path::PathBuf;
use time::UtcOffset;
use time::macros::offset;

pub const DEFAULT_ZWIFT_API_URL: &str = "https://us-or-rly101.zwift.com";
pub const DEFAULT_ZWIFTPOWER_URL: &str = "https://zwiftpower.com";
pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// What the daily signup check looks at and how it introduces itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    pub policy: SchedulePolicy,
    pub lookahead_hours: i64,
    pub team_id: u64,
    pub community: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            policy: SchedulePolicy::new(offset!(+1)),
            lookahead_hours: 4,
            team_id: 13264,
            community: "Backpedal".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZwiftConfig {
    pub api_url: String,
    pub zwiftpower_url: String,
    pub zwiftpower_cookie: Option<String>,
}

impl Default for ZwiftConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_ZWIFT_API_URL.to_string(),
            zwiftpower_url: DEFAULT_ZWIFTPOWER_URL.to_string(),
            zwiftpower_cookie: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub webhook_url: Option<String>,
    pub bot_token: Option<String>,
    pub guild_id: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DISCORD_API_URL.to_string(),
            webhook_url: None,
            bot_token: None,
            guild_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub tracked_file: PathBuf,
    pub reference: Option<PathBuf>,
    pub notify: NotifySettings,
    pub zwift: ZwiftConfig,
    pub chat: ChatConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            tracked_file: PathBuf::from("user_signups.csv"),
            reference: None,
            notify: NotifySettings::default(),
            zwift: ZwiftConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Parses `+01:00`, `-05:30`, `+2` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<UtcOffset, String> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }

    let invalid = || format!("invalid utc offset '{value}'; expected +HH[:MM]");
    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None => (rest, "0"),
    };
    let hours: i8 = hours.parse().map_err(|_| invalid())?;
    let minutes: i8 = minutes.parse().map_err(|_| invalid())?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())
}
