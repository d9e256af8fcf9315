//! Discord REST API helpers for the Roleypoly API.
//!
//! Every call goes through [`DiscordClient::fetch_with`], which attaches the
//! credential and Roleypoly's bot user-agent. HTTP failures are logged and
//! collapse to `None`; only transport and decode failures are errors.

pub mod client;
pub mod error;
pub mod oauth;
pub mod types;

pub use client::{AuthType, DEFAULT_API_BASE, DiscordClient, RequestInit, USER_AGENT};
pub use error::DiscordError;
pub use oauth::OAuthApp;
pub use types::{Guild, GuildRole, PartialGuild};
