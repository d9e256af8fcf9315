//! Discord API response shapes used by Roleypoly.
//!
//! Only the fields Roleypoly reads are modelled; serde ignores the rest.

use roleypoly_platform_access::{GuildSlug, parse_permission_string, parse_permissions};
use serde::{Deserialize, Serialize};

/// A guild as listed by `/users/@me/guilds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialGuild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub owner: bool,
    /// The user's effective permissions, as a decimal string.
    #[serde(default)]
    pub permissions: String,
}

impl PartialGuild {
    /// Resolves the user's permission level and drops everything else.
    #[must_use]
    pub fn into_slug(self) -> GuildSlug {
        let permission_level = parse_permissions(parse_permission_string(&self.permissions), self.owner);
        GuildSlug {
            id: self.id,
            name: self.name,
            icon: self.icon,
            permission_level,
        }
    }
}

/// A role within a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub permissions: String,
    #[serde(default)]
    pub managed: bool,
}

/// A guild as returned to the bot by `/guilds/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub roles: Vec<GuildRole>,
}
