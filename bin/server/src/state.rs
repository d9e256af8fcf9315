//! Shared application state.

use chrono::{DateTime, Utc};
use roleypoly_discord::{DiscordClient, Guild, OAuthApp};
use roleypoly_kv::{CacheError, CacheLayer, WrappedKvNamespace};
use roleypoly_platform_access::CallbackHosts;

use crate::auth::SessionRepository;
use crate::config::{ApiConfig, KvBackends};

/// State handed to every handler behind an `Arc`.
pub struct AppState {
    pub config: ApiConfig,
    pub sessions: SessionRepository,
    pub discord: DiscordClient,
    pub oauth_app: OAuthApp,
    pub callback_hosts: CallbackHosts,
    /// Guilds fetched as the bot, keyed `guild_<id>`.
    pub guild_cache: CacheLayer<String, Guild>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the application state over the given store backends.
    pub fn new(config: ApiConfig, backends: KvBackends) -> Self {
        let discord = DiscordClient::new(config.discord.api_base.clone());

        let fetcher = discord.clone();
        let bot_token = config.discord.bot_token.clone();
        let guild_cache = CacheLayer::new(
            WrappedKvNamespace::new(backends.guilds),
            |guild_id: &String| format!("guild_{guild_id}"),
            move |guild_id: String| {
                let discord = fetcher.clone();
                let bot_token = bot_token.clone();
                async move {
                    discord
                        .guild(&bot_token, &guild_id)
                        .await
                        .map_err(CacheError::fetch)
                }
            },
        )
        .with_ttl(config.cache.guild_ttl())
        .single_flight(config.cache.single_flight);

        Self {
            sessions: SessionRepository::new(
                WrappedKvNamespace::new(backends.sessions),
                config.session.ttl(),
            ),
            oauth_app: config.discord.oauth_app(),
            callback_hosts: CallbackHosts::new(
                config.api_public_uri.clone(),
                &config.allowed_callback_hosts,
            ),
            discord,
            guild_cache,
            started_at: Utc::now(),
            config,
        }
    }

    /// Whether `user_id` may use root-gated endpoints.
    #[must_use]
    pub fn is_root(&self, user_id: &str) -> bool {
        self.config.root_users.iter().any(|root| root == user_id)
    }

    /// Where Discord sends the browser after consent.
    #[must_use]
    pub fn oauth_redirect_uri(&self) -> String {
        format!(
            "{}/login-callback",
            self.config.api_public_uri.trim_end_matches('/')
        )
    }
}
