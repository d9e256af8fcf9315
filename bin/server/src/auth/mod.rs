//! Authentication for the Roleypoly API.
//!
//! This module provides:
//! - Bearer token parsing (`get_session_id`)
//! - The KV-backed session store, including short-lived OAuth state sessions
//! - Axum extractors gating routes on a session or on root access
//! - The Discord login flow routes
//!
//! Sessions are opaque ULID tokens presented as `Authorization: Bearer <id>`.
//! Expiry is left entirely to the store TTL: a session that has expired is
//! indistinguishable from one that never existed.

pub mod middleware;
pub mod routes;
pub mod store;

use axum::http::{HeaderMap, header};
use roleypoly_platform_access::SessionId;

pub use middleware::{AuthRejection, RequireRoot, RequireSession};
pub use routes::{get_session, login_bounce, login_callback, revoke_session};
pub use store::SessionRepository;

/// Extracts the session token from an `authorization: Bearer <token>` header.
///
/// Any other scheme or an empty token yields `None`. Text after a second
/// space is ignored.
#[must_use]
pub fn get_session_id(headers: &HeaderMap) -> Option<SessionId> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if scheme != "Bearer" || token.is_empty() {
        return None;
    }

    Some(SessionId::from(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(authorization));
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(
            get_session_id(&headers("Bearer 01HZX3")),
            Some(SessionId::from("01HZX3"))
        );
    }

    #[test]
    fn trailing_segments_are_ignored() {
        assert_eq!(
            get_session_id(&headers("Bearer abc extra")),
            Some(SessionId::from("abc"))
        );
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(get_session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn malformed_headers_are_none() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "bearer abc"] {
            assert_eq!(get_session_id(&headers(value)), None, "{value}");
        }
    }
}
