//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested sections (`DISCORD__BOT_TOKEN`, `KV__BACKEND`) and
//! commas separating list entries (`ROOT_USERS=1,2`).

use roleypoly_discord::{DEFAULT_API_BASE, OAuthApp};
use roleypoly_kv::{CloudflareKv, CloudflareKvConfig, KvNamespace, MemoryKv};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;

/// Keys whose environment values are comma-separated lists.
const LIST_KEYS: [&str; 2] = ["allowed_callback_hosts", "root_users"];

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Public origin of this API, e.g. `https://api.roleypoly.com`.
    /// Always an acceptable callback host.
    pub api_public_uri: String,

    /// Public origin of the web UI. Logins with no usable callback host
    /// land here.
    pub ui_public_uri: String,

    /// Additional callback hosts. Entries may contain `*` wildcards.
    #[serde(default, deserialize_with = "list")]
    pub allowed_callback_hosts: Vec<String>,

    /// Discord user IDs allowed through the root gate.
    #[serde(default, deserialize_with = "list")]
    pub root_users: Vec<String>,

    /// Discord application settings.
    pub discord: DiscordConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub kv: KvConfig,
}

/// Discord application and bot credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub bot_token: String,
    /// REST API base.
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

impl DiscordConfig {
    /// The OAuth application half of these settings.
    #[must_use]
    pub fn oauth_app(&self) -> OAuthApp {
        OAuthApp {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How long a login session lives in the store, in seconds.
    #[serde(default = "default_session_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl SessionConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

/// Guild data cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// TTL for cached guild lookups, in seconds.
    #[serde(default = "default_guild_ttl_seconds")]
    pub guild_ttl_seconds: u64,

    /// Coalesce concurrent misses for the same guild within this process.
    #[serde(default)]
    pub single_flight: bool,
}

impl CacheConfig {
    #[must_use]
    pub fn guild_ttl(&self) -> Duration {
        Duration::from_secs(self.guild_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            guild_ttl_seconds: default_guild_ttl_seconds(),
            single_flight: false,
        }
    }
}

/// Where sessions and cached guild data are stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum KvConfig {
    /// Process-local storage; lost on restart.
    #[default]
    Memory,
    /// Cloudflare Workers KV, one namespace per kind of data.
    Cloudflare {
        sessions: CloudflareKvConfig,
        guilds: CloudflareKvConfig,
    },
}

/// Backends for the sessions and guild-data namespaces.
pub struct KvBackends {
    pub sessions: Arc<dyn KvNamespace>,
    pub guilds: Arc<dyn KvNamespace>,
}

impl KvConfig {
    /// Instantiates the configured backends.
    #[must_use]
    pub fn backends(&self) -> KvBackends {
        match self {
            Self::Memory => KvBackends {
                sessions: Arc::new(MemoryKv::new()),
                guilds: Arc::new(MemoryKv::new()),
            },
            Self::Cloudflare { sessions, guilds } => KvBackends {
                sessions: Arc::new(CloudflareKv::new(sessions.clone())),
                guilds: Arc::new(CloudflareKv::new(guilds.clone())),
            },
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_discord_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// Accepts a single environment value where a list is expected.
///
/// `try_parsing` turns a lone snowflake such as `ROOT_USERS=1234` into an
/// integer before list splitting gets a chance.
fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entries {
        Many(Vec<String>),
        One(String),
        Id(i64),
    }

    Ok(match Entries::deserialize(deserializer)? {
        Entries::Many(entries) => entries,
        Entries::One(entry) => vec![entry],
        Entries::Id(id) => vec![id.to_string()],
    })
}

fn default_session_ttl_seconds() -> u64 {
    60 * 60 * 6
}

fn default_guild_ttl_seconds() -> u64 {
    60 * 60 * 2
}

impl ApiConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(environment())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    let mut environment = config::Environment::default()
        .separator("__")
        .list_separator(",")
        .try_parsing(true);
    for key in LIST_KEYS {
        environment = environment.with_list_parse_key(key);
    }
    environment
}
