//! Session records for authenticated users.
//!
//! A session is created once the Discord OAuth flow completes and is stored
//! in the sessions namespace under its bare ID. Expiry is left to the store's
//! TTL; nothing here tracks time.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::user::{DiscordUser, GuildSlug};

/// Opaque session token, presented as `Authorization: Bearer <id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh, time-sortable session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Discord OAuth token response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of `access_token` in seconds.
    pub expires_in: u64,
    pub scope: String,
    pub token_type: String,
}

/// Everything the API knows about a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    #[serde(rename = "sessionID")]
    pub session_id: SessionId,
    pub user: DiscordUser,
    pub guilds: Vec<GuildSlug>,
    pub tokens: AuthTokens,
}

impl SessionData {
    /// Returns the user's entry for a guild, if they are a member.
    #[must_use]
    pub fn guild(&self, guild_id: &str) -> Option<&GuildSlug> {
        self.guilds.iter().find(|g| g.id == guild_id)
    }

    /// Returns a copy safe to hand back to the client.
    #[must_use]
    pub fn public(&self) -> PublicSession {
        PublicSession {
            session_id: self.session_id.clone(),
            user: self.user.clone(),
            guilds: self.guilds.clone(),
        }
    }
}

/// A session with its OAuth tokens stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSession {
    #[serde(rename = "sessionID")]
    pub session_id: SessionId,
    pub user: DiscordUser,
    pub guilds: Vec<GuildSlug>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::UserGuildPermissions;

    fn session() -> SessionData {
        SessionData {
            session_id: SessionId::from("sess_test_123"),
            user: DiscordUser::new("100", "kat"),
            guilds: vec![GuildSlug {
                id: "200".to_string(),
                name: "Test Guild".to_string(),
                icon: None,
                permission_level: UserGuildPermissions::Admin,
            }],
            tokens: AuthTokens {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_in: 604_800,
                scope: "identify guilds".to_string(),
                token_type: "Bearer".to_string(),
            },
        }
    }

    #[test]
    fn session_id_from_str() {
        let id: SessionId = "test_session".into();
        assert_eq!(id.as_str(), "test_session");
        assert_eq!(id.to_string(), "test_session");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn guild_lookup() {
        let session = session();
        assert_eq!(
            session.guild("200").map(|g| g.permission_level),
            Some(UserGuildPermissions::Admin)
        );
        assert!(session.guild("300").is_none());
    }

    #[test]
    fn public_view_omits_tokens() {
        let json = serde_json::to_value(session().public()).expect("serialize");
        assert_eq!(json["sessionID"], "sess_test_123");
        assert!(json.get("tokens").is_none());
    }

    #[test]
    fn stored_form_keeps_tokens() {
        let json = serde_json::to_value(session()).expect("serialize");
        assert_eq!(json["tokens"]["access_token"], "access");
    }
}
