//! Cloudflare Workers KV backend over the REST API.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use rootcause::Report;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::error::KvError;
use crate::namespace::KvNamespace;

/// Default Cloudflare API base.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Shortest `expiration_ttl` Workers KV accepts, in seconds.
const MIN_EXPIRATION_TTL: u64 = 60;

/// Connection settings for a single Workers KV namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareKvConfig {
    /// Cloudflare account ID.
    pub account_id: String,
    /// KV namespace ID.
    pub namespace_id: String,
    /// API token with Workers KV edit permission.
    pub api_token: String,
    /// API base URL, overridable for testing.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// A [`KvNamespace`] backed by Cloudflare Workers KV.
#[derive(Debug, Clone)]
pub struct CloudflareKv {
    http: reqwest::Client,
    config: CloudflareKvConfig,
}

impl CloudflareKv {
    /// Creates a backend for the configured namespace.
    #[must_use]
    pub fn new(config: CloudflareKvConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn value_url(&self, key: &str) -> Result<Url, Report<KvError>> {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| KvError::Unavailable {
            reason: format!("invalid api base '{}': {e}", self.config.api_base),
        })?;

        url.path_segments_mut()
            .map_err(|()| KvError::Unavailable {
                reason: format!("api base '{}' cannot have a path", self.config.api_base),
            })?
            .pop_if_empty()
            .extend([
                "accounts",
                &self.config.account_id,
                "storage",
                "kv",
                "namespaces",
                &self.config.namespace_id,
                "values",
                key,
            ]);

        Ok(url)
    }

    async fn failure(key: &str, response: reqwest::Response) -> Report<KvError> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        KvError::RequestFailed {
            key: key.to_string(),
            status,
            body,
        }
        .into()
    }
}

fn unavailable(e: reqwest::Error) -> KvError {
    KvError::Unavailable {
        reason: e.to_string(),
    }
}

#[async_trait]
impl KvNamespace for CloudflareKv {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, Report<KvError>> {
        let response = self
            .http
            .get(self.value_url(key)?)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await.map_err(unavailable)?;
                Ok(Some(body))
            }
            _ => Err(Self::failure(key, response).await),
        }
    }

    #[instrument(skip(self, value))]
    async fn put(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), Report<KvError>> {
        let mut url = self.value_url(key)?;
        if let Some(ttl) = ttl {
            let seconds = ttl.as_secs().max(MIN_EXPIRATION_TTL);
            if seconds != ttl.as_secs() {
                tracing::debug!(
                    requested = ttl.as_secs(),
                    sent = seconds,
                    "Raised expiration TTL to the Workers KV minimum"
                );
            }
            url.query_pairs_mut()
                .append_pair("expiration_ttl", &seconds.to_string());
        }

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.config.api_token)
            .body(value)
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(Self::failure(key, response).await);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), Report<KvError>> {
        let response = self
            .http
            .delete(self.value_url(key)?)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(Self::failure(key, response).await);
        }
        Ok(())
    }
}
