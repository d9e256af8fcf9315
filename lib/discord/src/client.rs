//! Authenticated requests against the Discord REST API.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Method, Response};
use rootcause::Report;
use roleypoly_platform_access::DiscordUser;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::instrument;

use crate::error::DiscordError;
use crate::types::{Guild, PartialGuild};

/// Discord API base used in production.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v8";

/// User-agent sent on every request, in the form Discord asks bots to use.
pub const USER_AGENT: &str =
    "DiscordBot (https://github.com/roleypoly/roleypoly, git-main) (+https://roleypoly.com)";

/// How the credential is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// A user's OAuth access token.
    #[default]
    Bearer,
    /// The bot token.
    Bot,
}

impl AuthType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::Bot => "Bot",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request overrides.
///
/// `authorization` and `user-agent` in `headers` are always replaced.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Method,
    pub json: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

/// Client for the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    pub(crate) http: reqwest::Client,
    pub(crate) api_base: String,
}

impl DiscordClient {
    /// Creates a client for the given API base, e.g. [`DEFAULT_API_BASE`].
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Issues a GET to `path` (relative to the API base).
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: &str,
        auth_type: AuthType,
    ) -> Result<Option<T>, Report<DiscordError>> {
        self.fetch_with(path, auth, auth_type, RequestInit::default())
            .await
    }

    /// Issues a request to `path` with overrides.
    ///
    /// Returns `Ok(None)` for any non-success status, after logging the
    /// response body for statuses of 400 and above.
    #[instrument(skip(self, auth, init), fields(method = %init.method))]
    pub async fn fetch_with<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: &str,
        auth_type: AuthType,
        init: RequestInit,
    ) -> Result<Option<T>, Report<DiscordError>> {
        let mut headers = init.headers;
        let credential = HeaderValue::from_str(&format!("{auth_type} {auth}"))
            .map_err(|_| DiscordError::InvalidCredential)?;
        headers.insert(AUTHORIZATION, credential);
        headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));

        let mut request = self
            .http
            .request(init.method, format!("{}{path}", self.api_base))
            .headers(headers);
        if let Some(json) = &init.json {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|e| DiscordError::Transport {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        decode_response(path, auth_type.as_str(), response).await
    }

    /// `/users/@me` for a user access token.
    pub async fn current_user(
        &self,
        access_token: &str,
    ) -> Result<Option<DiscordUser>, Report<DiscordError>> {
        self.fetch("/users/@me", access_token, AuthType::Bearer)
            .await
    }

    /// `/users/@me/guilds` for a user access token.
    pub async fn current_user_guilds(
        &self,
        access_token: &str,
    ) -> Result<Option<Vec<PartialGuild>>, Report<DiscordError>> {
        self.fetch("/users/@me/guilds", access_token, AuthType::Bearer)
            .await
    }

    /// `/guilds/{id}` as the bot.
    pub async fn guild(
        &self,
        bot_token: &str,
        guild_id: &str,
    ) -> Result<Option<Guild>, Report<DiscordError>> {
        self.fetch(&format!("/guilds/{guild_id}"), bot_token, AuthType::Bot)
            .await
    }
}

/// Shared tail of every Discord call: log-and-drop failures, decode successes.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    path: &str,
    auth_type: &str,
    response: Response,
) -> Result<Option<T>, Report<DiscordError>> {
    let status = response.status();

    if !status.is_success() {
        if status.as_u16() >= 400 {
            let payload = response.text().await.unwrap_or_default();
            tracing::error!(
                path,
                auth_type,
                status = status.as_u16(),
                payload = %payload,
                "discord fetch failed"
            );
        }
        return Ok(None);
    }

    let body = response.json::<T>().await.map_err(|e| DiscordError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Some(body))
}
