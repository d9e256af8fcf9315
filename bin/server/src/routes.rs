//! HTTP routes.

use axum::{
    Router,
    extract::State,
    middleware,
    response::Response,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use roleypoly_kv::CacheOptions;
use roleypoly_platform_access::AuthorizationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, RequireRoot, RequireSession};
use crate::config::KvConfig;
use crate::error::ApiError;
use crate::extract::{PathParams, QueryParams};
use crate::responses;
use crate::state::AppState;

/// Builds the API router.
pub fn router(state: Arc<AppState>) -> Router {
    with_layers(routes()).with_state(state)
}

fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login-bounce", get(auth::login_bounce))
        .route("/login-callback", get(auth::login_callback))
        .route("/get-session", get(auth::get_session))
        .route("/revoke-session", post(auth::revoke_session))
        .route("/get-guild/{id}", get(get_guild))
        .route("/sysinfo", get(sysinfo))
}

fn with_layers(routes: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    routes
        .fallback(fallback)
        .method_not_allowed_fallback(fallback)
        .layer(middleware::from_fn(responses::catch_failures))
        .layer(middleware::from_fn(responses::preflight))
        .layer(middleware::map_response(cors))
        .layer(TraceLayer::new_for_http())
}

async fn fallback() -> Response {
    responses::not_found()
}

/// Covers responses built outside [`responses::respond`], such as redirects.
async fn cors(mut response: Response) -> Response {
    responses::add_cors(response.headers_mut());
    response
}

/// Query parameters for guild lookups.
#[derive(Debug, Default, Deserialize)]
pub struct GuildQuery {
    /// Bypass the cache. Honoured for managers and admins only.
    #[serde(default)]
    fresh: bool,
}

/// Returns a guild the caller belongs to, as seen by the bot.
async fn get_guild(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
    PathParams(guild_id): PathParams<String>,
    QueryParams(query): QueryParams<GuildQuery>,
) -> Result<Response, ApiError> {
    let Some(membership) = session.guild(&guild_id) else {
        let err = AuthorizationError::NotGuildMember {
            user_id: session.user.id.clone(),
            guild_id,
        };
        tracing::warn!(error = %err, "Guild access denied");
        return Ok(responses::low_permissions());
    };

    let options = if query.fresh && membership.permission_level.can_manage() {
        CacheOptions::refresh()
    } else {
        CacheOptions::default()
    };

    match state.guild_cache.get_with(guild_id, options).await? {
        Some(guild) => Ok(responses::json(&guild)),
        None => Ok(responses::not_found()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SysInfo<'a> {
    version: &'static str,
    started_at: DateTime<Utc>,
    api_public_uri: &'a str,
    ui_public_uri: &'a str,
    kv_backend: &'static str,
    guild_cache_ttl_seconds: Option<u64>,
    single_flight: bool,
    root_users: usize,
    allowed_callback_hosts: usize,
}

async fn sysinfo(
    State(state): State<Arc<AppState>>,
    RequireRoot(_): RequireRoot,
) -> Response {
    let config = &state.config;
    responses::json(&SysInfo {
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
        api_public_uri: &config.api_public_uri,
        ui_public_uri: &config.ui_public_uri,
        kv_backend: match config.kv {
            KvConfig::Memory => "memory",
            KvConfig::Cloudflare { .. } => "cloudflare",
        },
        guild_cache_ttl_seconds: state.guild_cache.ttl().map(|ttl| ttl.as_secs()),
        single_flight: config.cache.single_flight,
        root_users: config.root_users.len(),
        allowed_callback_hosts: config.allowed_callback_hosts.len(),
    })
}
