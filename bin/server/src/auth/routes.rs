//! Authentication routes for the Discord login flow and session management.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use roleypoly_core::StateId;
use roleypoly_discord::PartialGuild;
use roleypoly_platform_access::{SessionData, SessionId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::RequireSession;
use crate::error::ApiError;
use crate::extract::QueryParams;
use crate::responses;
use crate::state::AppState;

/// State carried across the OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginState {
    pub(crate) callback_host: String,
}

/// Query parameters for the login bounce.
#[derive(Debug, Deserialize)]
pub struct BounceQuery {
    cbh: Option<String>,
}

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// Starts a login by redirecting to Discord's consent screen.
///
/// The requested callback host is remembered in a state session; hosts not
/// on the allow-list are replaced with the UI's public URI.
pub async fn login_bounce(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<BounceQuery>,
) -> Result<Response, ApiError> {
    let callback_host = match query.cbh {
        Some(cbh) if state.callback_hosts.is_allowed(&cbh) => cbh,
        Some(cbh) => {
            tracing::warn!(callback_host = %cbh, "Rejected callback host");
            state.config.ui_public_uri.clone()
        }
        None => state.config.ui_public_uri.clone(),
    };

    let state_id = state
        .sessions
        .setup_state_session(LoginState { callback_host })
        .await?;

    let url = state.discord.authorize_url(
        &state.oauth_app,
        &state.oauth_redirect_uri(),
        &state_id.bare(),
    )?;

    Ok(Redirect::to(url.as_str()).into_response())
}

/// Completes a login after Discord redirects back.
///
/// Any failure past parameter validation sends the browser to the UI's
/// error page rather than returning JSON.
pub async fn login_callback(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<CallbackQuery>,
) -> Response {
    let (Some(code), Some(state_param)) = (query.code, query.state) else {
        return responses::missing_parameters();
    };

    let error_page = format!(
        "{}/machinery/error?error_code=authFailure",
        state.config.ui_public_uri.trim_end_matches('/')
    );

    responses::resolve_failures_with(
        move || Redirect::to(&error_page).into_response(),
        complete_login(&state, &code, &state_param),
    )
    .await
}

async fn complete_login(
    state: &AppState,
    code: &str,
    state_param: &str,
) -> Result<Response, ApiError> {
    let state_id = StateId::from_str(state_param).map_err(|e| ApiError::InvalidState {
        details: e.to_string(),
    })?;

    let login: LoginState = state
        .sessions
        .get_state_session(&state_id)
        .await?
        .ok_or_else(|| ApiError::InvalidState {
            details: format!("{state_id} not found or expired"),
        })?;

    let tokens = state
        .discord
        .exchange_code(&state.oauth_app, code, &state.oauth_redirect_uri())
        .await?
        .ok_or_else(|| ApiError::Discord {
            details: "authorization code was rejected".to_string(),
        })?;

    let user = state
        .discord
        .current_user(&tokens.access_token)
        .await?
        .ok_or_else(|| ApiError::Discord {
            details: "could not load the current user".to_string(),
        })?;

    let guilds = state
        .discord
        .current_user_guilds(&tokens.access_token)
        .await?
        .ok_or_else(|| ApiError::Discord {
            details: "could not load the current user's guilds".to_string(),
        })?;

    let session = SessionData {
        session_id: SessionId::generate(),
        user,
        guilds: guilds.into_iter().map(PartialGuild::into_slug).collect(),
        tokens,
    };
    state.sessions.create(&session).await?;

    tracing::info!(
        user_id = %session.user.id,
        guilds = session.guilds.len(),
        "Session created"
    );

    // The allow-list may have changed since the bounce.
    let callback_host = if state.callback_hosts.is_allowed(&login.callback_host) {
        login.callback_host
    } else {
        state.config.ui_public_uri.clone()
    };

    Ok(Redirect::to(&format!(
        "{}/machinery/new-session/{}",
        callback_host.trim_end_matches('/'),
        session.session_id
    ))
    .into_response())
}

/// Returns the caller's session without its OAuth tokens.
pub async fn get_session(RequireSession(session): RequireSession) -> Response {
    responses::json(&session.public())
}

/// Ends the caller's session.
///
/// Token revocation at Discord is best effort; the session is deleted
/// regardless.
pub async fn revoke_session(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
) -> Result<Response, ApiError> {
    match state
        .discord
        .revoke_token(&state.oauth_app, &session.tokens.access_token)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(user_id = %session.user.id, "Discord refused token revocation");
        }
        Err(e) => {
            tracing::warn!(user_id = %session.user.id, error = %e, "Token revocation failed");
        }
    }

    state.sessions.delete(&session.session_id).await?;
    tracing::info!(user_id = %session.user.id, "Session revoked");

    Ok(responses::ok())
}
