//! Platform access for the Roleypoly API.
//!
//! This crate provides:
//! - Session records (`SessionData`, `SessionId`)
//! - Guild permission levels (`UserGuildPermissions`, `parse_permissions`)
//! - The post-login callback host allow-list (`CallbackHosts`)
//! - Authentication and authorization error types
//!
//! # Example
//!
//! ```
//! use roleypoly_platform_access::{CallbackHosts, UserGuildPermissions, parse_permissions};
//!
//! assert_eq!(parse_permissions(1 << 28, false), UserGuildPermissions::Manager);
//!
//! let hosts = CallbackHosts::new(
//!     "https://api.roleypoly.com",
//!     &["https://*.roleypoly.pages.dev".to_string()],
//! );
//! assert!(hosts.is_allowed("https://preview.roleypoly.pages.dev"));
//! ```

pub mod callback;
pub mod error;
pub mod permissions;
pub mod session;
pub mod user;

pub use callback::CallbackHosts;
pub use error::{AuthenticationError, AuthorizationError};
pub use permissions::{UserGuildPermissions, parse_permission_string, parse_permissions};
pub use session::{AuthTokens, PublicSession, SessionData, SessionId};
pub use user::{DiscordUser, GuildSlug};
