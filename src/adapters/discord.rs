use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::identity::match_member;
use crate::ports;
use crate::types::chat::{Emoji, Member, OutgoingMessage};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

const MEMBER_PAGE_LIMIT: &str = "1000";

/// Webhook delivery plus the few guild reads the bot needs.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    config: ChatConfig,
    members: Arc<OnceLock<Vec<Member>>>,
}

impl DiscordClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ChatError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            config,
            members: Arc::new(OnceLock::new()),
        })
    }

    fn guild_url(&self, path: &str) -> Result<String, ChatError> {
        let guild = self
            .config
            .guild_id
            .ok_or(ChatError::NotConfigured("guild id"))?;
        Ok(format!(
            "{}/guilds/{guild}/{path}",
            self.config.api_url.trim_end_matches('/')
        ))
    }

    async fn get_bot<T: DeserializeOwned>(&self, url: &str) -> Result<T, ChatError> {
        let token = self
            .config
            .bot_token
            .as_deref()
            .ok_or(ChatError::NotConfigured("bot token"))?;
        debug!(url, "chat api request");
        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {token}"))
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))
    }

    async fn member_snapshot(&self) -> Result<&[Member], ChatError> {
        if let Some(members) = self.members.get() {
            return Ok(members);
        }
        let url = self.guild_url("members")?;
        let raw: Vec<RawMember> = self
            .get_bot(&format!("{url}?limit={MEMBER_PAGE_LIMIT}"))
            .await?;
        let members = raw.into_iter().filter_map(RawMember::into_member).collect();
        let _ = self.members.set(members);
        Ok(self.members.get().map(Vec::as_slice).unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct RawEmoji {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    animated: bool,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    username: String,
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: Option<RawUser>,
    nick: Option<String>,
}

impl RawMember {
    fn into_member(self) -> Option<Member> {
        let user = self.user?;
        Some(Member {
            id: user.id.parse().ok()?,
            username: user.username,
            global_name: user.global_name,
            nick: self.nick,
        })
    }
}

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, ChatError>> + Send + 'a>>;

impl ports::ChatSender for DiscordClient {
    type SendFut<'a>
        = BoxFut<'a, ()>
    where
        Self: 'a;

    fn send<'a>(&'a self, message: &'a OutgoingMessage) -> Self::SendFut<'a> {
        Box::pin(async move {
            let webhook = self
                .config
                .webhook_url
                .as_deref()
                .ok_or(ChatError::NotConfigured("webhook url"))?;
            let response = self
                .http
                .post(webhook)
                .query(&[("wait", "true")])
                .json(message)
                .send()
                .await
                .map_err(|err| ChatError::Transport(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                warn!(status = status.as_u16(), "webhook rejected message");
                return Err(ChatError::Status(status.as_u16()));
            }
            Ok(())
        })
    }
}

impl ports::EmojiSource for DiscordClient {
    type EmojiFut<'a>
        = BoxFut<'a, Vec<Emoji>>
    where
        Self: 'a;

    fn emojis<'a>(&'a self) -> Self::EmojiFut<'a> {
        Box::pin(async move {
            let raw: Vec<RawEmoji> = self.get_bot(&self.guild_url("emojis")?).await?;
            Ok(raw
                .into_iter()
                .filter_map(|emoji| {
                    Some(Emoji {
                        id: emoji.id?.parse().ok()?,
                        name: emoji.name?,
                        animated: emoji.animated,
                    })
                })
                .collect())
        })
    }
}

impl ports::NameDirectory for DiscordClient {
    type MemberFut<'a>
        = BoxFut<'a, Option<Member>>
    where
        Self: 'a;

    fn convert<'a>(&'a self, query: &'a str) -> Self::MemberFut<'a> {
        Box::pin(async move {
            if self.config.bot_token.is_none() || self.config.guild_id.is_none() {
                debug!(query, "member directory not configured");
                return Ok(None);
            }
            let members = self.member_snapshot().await?;
            Ok(match_member(members, query).cloned())
        })
    }
}
