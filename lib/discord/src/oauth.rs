//! Discord OAuth2 authorization-code flow.

use reqwest::Url;
use reqwest::header::USER_AGENT as USER_AGENT_HEADER;
use rootcause::Report;
use roleypoly_platform_access::AuthTokens;
use serde::Deserialize;
use tracing::instrument;

use crate::client::{DiscordClient, USER_AGENT, decode_response};
use crate::error::DiscordError;

/// Scopes Roleypoly asks for at login.
pub const SCOPES: &str = "identify guilds";

/// The registered Discord OAuth application.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
}

impl DiscordClient {
    /// Builds the consent URL the browser is sent to.
    ///
    /// `state` comes back untouched on the callback.
    pub fn authorize_url(
        &self,
        app: &OAuthApp,
        redirect_uri: &str,
        state: &str,
    ) -> Result<Url, Report<DiscordError>> {
        let url = Url::parse_with_params(
            &format!("{}/oauth2/authorize", self.api_base),
            &[
                ("client_id", app.client_id.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("prompt", "none"),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ],
        )
        .map_err(|e| DiscordError::InvalidUrl {
            reason: e.to_string(),
        })?;
        Ok(url)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// Returns `Ok(None)` when Discord rejects the code.
    #[instrument(skip(self, app, code))]
    pub async fn exchange_code(
        &self,
        app: &OAuthApp,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Option<AuthTokens>, Report<DiscordError>> {
        self.post_form(
            "/oauth2/token",
            &[
                ("client_id", app.client_id.as_str()),
                ("client_secret", app.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("scope", SCOPES),
            ],
        )
        .await
    }

    /// Revokes an access or refresh token.
    ///
    /// Returns whether Discord accepted the revocation.
    #[instrument(skip(self, app, token))]
    pub async fn revoke_token(
        &self,
        app: &OAuthApp,
        token: &str,
    ) -> Result<bool, Report<DiscordError>> {
        let revoked: Option<serde_json::Value> = self
            .post_form(
                "/oauth2/token/revoke",
                &[
                    ("client_id", app.client_id.as_str()),
                    ("client_secret", app.client_secret.as_str()),
                    ("token", token),
                ],
            )
            .await?;
        Ok(revoked.is_some())
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, Report<DiscordError>> {
        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .header(USER_AGENT_HEADER, USER_AGENT)
            .form(form)
            .send()
            .await
            .map_err(|e| DiscordError::Transport {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        decode_response(path, "client_credentials", response).await
    }
}
