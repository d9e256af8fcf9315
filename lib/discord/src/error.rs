//! Discord client error types.

use std::fmt;

/// Errors from talking to the Discord API.
///
/// Non-success HTTP statuses are not errors; they surface as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordError {
    /// The request never got a response.
    Transport { path: String, reason: String },
    /// The response body was not the expected JSON.
    Decode { path: String, reason: String },
    /// The credential cannot be sent as a header value.
    InvalidCredential,
    /// A URL could not be built from the configured API base.
    InvalidUrl { reason: String },
}

impl fmt::Display for DiscordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { path, reason } => {
                write!(f, "discord request to '{path}' failed: {reason}")
            }
            Self::Decode { path, reason } => {
                write!(f, "discord response from '{path}' did not decode: {reason}")
            }
            Self::InvalidCredential => write!(f, "credential is not a valid header value"),
            Self::InvalidUrl { reason } => write!(f, "invalid discord url: {reason}"),
        }
    }
}

impl std::error::Error for DiscordError {}
