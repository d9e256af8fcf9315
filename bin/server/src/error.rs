//! Domain error types for request handlers.
//!
//! Library failures arrive as `rootcause` reports and are flattened into
//! [`ApiError`]. Clients only ever see the generic 500 body; the details go
//! to the log.

use axum::response::{IntoResponse, Response};
use roleypoly_discord::DiscordError;
use roleypoly_kv::{CacheError, KvError};
use rootcause::Report;
use std::fmt;

use crate::responses;

/// Errors raised while handling a request.
#[derive(Debug)]
pub enum ApiError {
    /// The key-value store failed.
    Store { details: String },
    /// A Discord call failed in transport or decoding.
    Discord { details: String },
    /// An OAuth state parameter could not be resolved.
    InvalidState { details: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { details } => write!(f, "store error: {}", details),
            Self::Discord { details } => write!(f, "discord error: {}", details),
            Self::InvalidState { details } => write!(f, "invalid oauth state: {}", details),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<Report<KvError>> for ApiError {
    fn from(report: Report<KvError>) -> Self {
        Self::Store {
            details: report.to_string(),
        }
    }
}

impl From<Report<CacheError>> for ApiError {
    fn from(report: Report<CacheError>) -> Self {
        Self::Store {
            details: report.to_string(),
        }
    }
}

impl From<Report<DiscordError>> for ApiError {
    fn from(report: Report<DiscordError>) -> Self {
        Self::Discord {
            details: report.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        responses::internal_server_error()
    }
}
