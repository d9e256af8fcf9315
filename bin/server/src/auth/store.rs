//! Session storage over a key-value namespace.

use roleypoly_core::{Result, StateId};
use roleypoly_kv::{KvError, WrappedKvNamespace};
use roleypoly_platform_access::{SessionData, SessionId};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Lifetime of an OAuth state session.
pub const STATE_SESSION_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Serialize, Deserialize)]
struct StateSession<T> {
    data: T,
}

/// Repository for login sessions and OAuth state sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    kv: WrappedKvNamespace,
    ttl: Duration,
}

impl SessionRepository {
    /// Creates a repository whose sessions live for `ttl`.
    pub fn new(kv: WrappedKvNamespace, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Finds a session by its token.
    pub async fn get(&self, session_id: &SessionId) -> Result<Option<SessionData>, KvError> {
        self.kv.get(session_id.as_str()).await
    }

    /// Writes an arbitrary value into the sessions namespace.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), KvError> {
        self.kv.put(key, value, ttl).await
    }

    /// Stores a new login session under its ID with the session TTL.
    pub async fn create(&self, session: &SessionData) -> Result<(), KvError> {
        self.put(session.session_id.as_str(), session, Some(self.ttl))
            .await
    }

    /// Deletes a session.
    pub async fn delete(&self, session_id: &SessionId) -> Result<(), KvError> {
        self.kv.delete(session_id.as_str()).await
    }

    /// Stores `data` under a fresh state ID for five minutes.
    pub async fn setup_state_session<T: Serialize>(
        &self,
        data: T,
    ) -> Result<StateId, KvError> {
        let state_id = StateId::new();
        self.put(
            &state_id.storage_key(),
            &StateSession { data },
            Some(STATE_SESSION_TTL),
        )
        .await?;
        Ok(state_id)
    }

    /// Reads the data stored by [`Self::setup_state_session`].
    pub async fn get_state_session<T: DeserializeOwned>(
        &self,
        state_id: &StateId,
    ) -> Result<Option<T>, KvError> {
        let session: Option<StateSession<T>> = self.kv.get(&state_id.storage_key()).await?;
        Ok(session.map(|s| s.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roleypoly_kv::MemoryKv;
    use roleypoly_platform_access::{AuthTokens, DiscordUser};
    use std::sync::Arc;

    fn repository() -> SessionRepository {
        SessionRepository::new(
            WrappedKvNamespace::new(Arc::new(MemoryKv::new())),
            Duration::from_secs(60),
        )
    }

    fn session(id: &str) -> SessionData {
        SessionData {
            session_id: SessionId::from(id),
            user: DiscordUser::new("100", "kat"),
            guilds: Vec::new(),
            tokens: AuthTokens {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_in: 604_800,
                scope: "identify guilds".to_string(),
                token_type: "Bearer".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn create_get_delete() {
        let repo = repository();
        let stored = session("sess_1");

        repo.create(&stored).await.expect("create");
        assert_eq!(
            repo.get(&SessionId::from("sess_1")).await.expect("get"),
            Some(stored)
        );

        repo.delete(&SessionId::from("sess_1")).await.expect("delete");
        assert_eq!(repo.get(&SessionId::from("sess_1")).await.expect("get"), None);
    }

    #[tokio::test]
    async fn unknown_session_is_none() {
        let repo = repository();
        assert_eq!(repo.get(&SessionId::from("nope")).await.expect("get"), None);
    }

    #[tokio::test]
    async fn state_session_round_trip() {
        let repo = repository();
        let state_id = repo
            .setup_state_session("https://roleypoly.com".to_string())
            .await
            .expect("setup");

        let data: Option<String> = repo.get_state_session(&state_id).await.expect("get");
        assert_eq!(data.as_deref(), Some("https://roleypoly.com"));
    }

    #[tokio::test]
    async fn state_sessions_are_wrapped_under_prefixed_key() {
        let backend = Arc::new(MemoryKv::new());
        let repo = SessionRepository::new(
            WrappedKvNamespace::new(backend.clone()),
            Duration::from_secs(60),
        );

        let state_id = repo.setup_state_session(42u32).await.expect("setup");

        let raw = roleypoly_kv::KvNamespace::get(backend.as_ref(), &state_id.storage_key())
            .await
            .expect("raw get");
        assert!(state_id.storage_key().starts_with("state_"));
        assert_eq!(raw.as_deref(), Some(r#"{"data":42}"#));
    }

    #[tokio::test(start_paused = true)]
    async fn state_sessions_expire_after_five_minutes() {
        let repo = repository();
        let state_id = repo.setup_state_session(1u8).await.expect("setup");

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(repo.get_state_session::<u8>(&state_id).await.expect("get"), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(repo.get_state_session::<u8>(&state_id).await.expect("get"), None);
    }
}
