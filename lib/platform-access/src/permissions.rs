//! Guild permission levels derived from Discord permission bitmasks.
//!
//! Discord reports a member's effective permissions as a 64-bit bitmask
//! (serialized as a decimal string in API v8). Roleypoly only cares about
//! two of those bits, and collapses them into three levels.

use serde::{Deserialize, Serialize};

/// Discord `ADMINISTRATOR` permission bit.
pub const ADMINISTRATOR: u64 = 1 << 3;

/// Discord `MANAGE_ROLES` permission bit.
pub const MANAGE_ROLES: u64 = 1 << 28;

/// A user's access level within a single guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserGuildPermissions {
    /// Regular member: may pick their own roles.
    User,
    /// Holds `MANAGE_ROLES`: may edit the guild's role picker.
    Manager,
    /// Guild owner or holds `ADMINISTRATOR`.
    Admin,
}

impl UserGuildPermissions {
    /// Returns true if this level may manage the guild's roles.
    #[must_use]
    pub fn can_manage(&self) -> bool {
        *self >= Self::Manager
    }
}

/// Returns true when every bit of `permission` is set in `permissions`.
#[must_use]
pub fn evaluate_permission(permissions: u64, permission: u64) -> bool {
    permissions & permission == permission
}

/// Derives the permission level for a guild member.
///
/// Ownership wins regardless of the bitmask.
#[must_use]
pub fn parse_permissions(permissions: u64, owner: bool) -> UserGuildPermissions {
    if owner || evaluate_permission(permissions, ADMINISTRATOR) {
        return UserGuildPermissions::Admin;
    }

    if evaluate_permission(permissions, MANAGE_ROLES) {
        return UserGuildPermissions::Manager;
    }

    UserGuildPermissions::User
}

/// Parses Discord's decimal-string permission field.
///
/// Anything unparseable is treated as no permissions.
#[must_use]
pub fn parse_permission_string(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}
