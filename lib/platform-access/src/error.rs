//! Error types for the platform-access crate.
//!
//! - `AuthenticationError`: the request does not carry a usable session
//! - `AuthorizationError`: the session is valid but not allowed to proceed

use std::fmt;

/// Errors from resolving a request's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No `authorization` header, wrong scheme, or empty token.
    MissingAuthentication,
    /// Token was well-formed but no session exists for it.
    SessionNotFound { session_id: String },
}

impl AuthenticationError {
    /// Message returned to the client.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingAuthentication => "missing authentication",
            Self::SessionNotFound { .. } => "authentication expired or not found",
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAuthentication => {
                write!(f, "request carries no bearer token")
            }
            Self::SessionNotFound { session_id } => {
                write!(f, "session not found or expired: {session_id}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from permission checks on an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The user is not on the root allow-list.
    NotRoot { user_id: String },
    /// The user is not a member of the guild they asked about.
    NotGuildMember { user_id: String, guild_id: String },
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRoot { user_id } => {
                write!(f, "user {user_id} is not a root user")
            }
            Self::NotGuildMember { user_id, guild_id } => {
                write!(f, "user {user_id} is not a member of guild {guild_id}")
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}
