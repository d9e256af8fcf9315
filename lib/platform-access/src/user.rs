//! Discord identities carried in a session.

use serde::{Deserialize, Serialize};

use crate::permissions::UserGuildPermissions;

/// A Discord user, as returned by `/users/@me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordUser {
    /// Snowflake ID.
    pub id: String,
    pub username: String,
    pub discriminator: String,
    /// Avatar hash, absent when the user has the default avatar.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl DiscordUser {
    /// Creates a user with no avatar.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: "0".to_string(),
            avatar: None,
            bot: false,
        }
    }
}

/// A guild the session's user belongs to, with their resolved access level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildSlug {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub permission_level: UserGuildPermissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_user_defaults_optional_fields() {
        let user: DiscordUser = serde_json::from_str(
            r#"{"id":"62601275618889728","username":"kat","discriminator":"0001"}"#,
        )
        .expect("deserialize");

        assert_eq!(user.id, "62601275618889728");
        assert!(user.avatar.is_none());
        assert!(!user.bot);
    }

    #[test]
    fn guild_slug_uses_camel_case() {
        let slug = GuildSlug {
            id: "386659935687147521".to_string(),
            name: "Roleypoly".to_string(),
            icon: None,
            permission_level: UserGuildPermissions::Manager,
        };

        let json = serde_json::to_value(&slug).expect("serialize");
        assert_eq!(json["permissionLevel"], "manager");
    }
}
