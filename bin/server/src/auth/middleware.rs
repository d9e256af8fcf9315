//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use roleypoly_platform_access::{AuthenticationError, AuthorizationError, SessionData};
use serde_json::json;
use std::sync::Arc;

use super::get_session_id;
use crate::responses::{self, ResponseInit};
use crate::state::AppState;

/// Extractor requiring a live session.
///
/// No store lookup happens unless the request carries a well-formed bearer
/// token.
pub struct RequireSession(pub SessionData);

impl<S> FromRequestParts<S> for RequireSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);

        let session_id = get_session_id(&parts.headers).ok_or(AuthRejection::NotAuthenticated(
            AuthenticationError::MissingAuthentication,
        ))?;

        let session = app_state
            .sessions
            .get(&session_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to look up session");
                AuthRejection::InternalError
            })?
            .ok_or_else(|| {
                AuthRejection::NotAuthenticated(AuthenticationError::SessionNotFound {
                    session_id: session_id.to_string(),
                })
            })?;

        Ok(RequireSession(session))
    }
}

/// Extractor requiring a session whose user is on the root list.
///
/// Everyone else is told the route does not exist.
pub struct RequireRoot(pub SessionData);

impl<S> FromRequestParts<S> for RequireRoot
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireSession(session) = RequireSession::from_request_parts(parts, state).await?;
        let app_state = Arc::<AppState>::from_ref(state);

        if !app_state.is_root(&session.user.id) {
            let err = AuthorizationError::NotRoot {
                user_id: session.user.id.clone(),
            };
            tracing::warn!(error = %err, path = %parts.uri.path(), "Root access denied");
            return Err(AuthRejection::NotFound);
        }

        Ok(RequireRoot(session))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated(AuthenticationError),
    NotFound,
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated(err) => responses::respond(
                &json!({ "error": err.public_message() }),
                ResponseInit::status(StatusCode::FORBIDDEN),
            ),
            Self::NotFound => responses::respond(
                &json!({ "error": "not_found" }),
                ResponseInit::status(StatusCode::NOT_FOUND),
            ),
            Self::InternalError => responses::internal_server_error(),
        }
    }
}
