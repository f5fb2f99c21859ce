use crate::models::UserSession;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with session storage
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Source of the current time, replaceable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for simulating TTL expiry
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Expiring per-user session storage.
///
/// `put` overwrites wholesale and resets the TTL; there is no transaction
/// spanning `get` and `put`, so concurrent writers for one user race and the
/// last write wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserSession>, SessionError>;

    async fn put(&self, user_id: &str, session: UserSession) -> Result<(), SessionError>;
}

/// Session key builder
pub struct SessionKey;

impl SessionKey {
    pub fn user(user_id: &str) -> String {
        format!("line_user_{}", user_id)
    }
}

/// In-process session store backed by a bounded moka cache.
///
/// moka evicts idle entries on its own schedule; expiry as observed by callers
/// is decided against the injected [`Clock`] so it can be simulated.
pub struct MemorySessionStore {
    cache: moka::future::Cache<String, Vec<u8>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        Self::with_clock(max_entries, ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: u64, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let cache = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            ttl: chrono::Duration::seconds(ttl_secs as i64),
            clock,
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserSession>, SessionError> {
        let key = SessionKey::user(user_id);

        let Some(bytes) = self.cache.get(&key).await else {
            tracing::trace!("Session miss: {}", key);
            return Ok(None);
        };

        let session: UserSession = serde_json::from_slice(&bytes)?;
        if session.is_expired(self.clock.now()) {
            tracing::debug!("Session expired: {}", key);
            self.cache.invalidate(&key).await;
            return Ok(None);
        }

        tracing::trace!("Session hit: {}", key);
        Ok(Some(session))
    }

    async fn put(&self, user_id: &str, mut session: UserSession) -> Result<(), SessionError> {
        let key = SessionKey::user(user_id);
        session.expires_at = self.clock.now() + self.ttl;

        let bytes = serde_json::to_vec(&session)?;
        self.cache.insert(key.clone(), bytes).await;

        tracing::debug!(step = ?session.step, "Session stored: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceKind, PriceRange, Step};

    fn store_with_clock() -> (MemorySessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = MemorySessionStore::with_clock(100, 1800, clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_session() {
        let (store, clock) = store_with_clock();
        let mut session = UserSession::new(clock.now());
        session.step = Step::PriceSet;
        session.price_range = Some(PriceRange { min: 100, max: 500, kind: PriceKind::Range });

        store.put("U1", session.clone()).await.unwrap();
        let loaded = store.get("U1").await.unwrap().unwrap();

        assert_eq!(loaded.step, Step::PriceSet);
        assert_eq!(loaded.price_range, session.price_range);
        assert_eq!(loaded.created_at, session.created_at);
        assert_eq!(loaded.expires_at, clock.now() + chrono::Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_absent() {
        let (store, _) = store_with_clock();
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let (store, clock) = store_with_clock();
        store.put("U1", UserSession::new(clock.now())).await.unwrap();

        clock.advance(chrono::Duration::minutes(29));
        assert!(store.get("U1").await.unwrap().is_some());

        clock.advance(chrono::Duration::minutes(1));
        assert!(store.get("U1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_resets_ttl() {
        let (store, clock) = store_with_clock();
        store.put("U1", UserSession::new(clock.now())).await.unwrap();

        clock.advance(chrono::Duration::minutes(20));
        let session = store.get("U1").await.unwrap().unwrap();
        store.put("U1", session).await.unwrap();

        clock.advance(chrono::Duration::minutes(20));
        assert!(store.get("U1").await.unwrap().is_some());
    }

    #[test]
    fn test_session_key_builder() {
        assert_eq!(SessionKey::user("U123"), "line_user_U123");
    }
}
