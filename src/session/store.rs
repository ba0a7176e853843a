//! Session persistence
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the server remembers about a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
}

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session store error: {0}")]
    Backend(String),
}

/// Key-value store mapping session ids to session state.
///
/// `save` writes the whole state at once, so an entry is either absent or
/// fully written.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, SessionStoreError>;

    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionStoreError>;

    /// Overwrite the state of a session that is still present. Returns
    /// `false` without writing when the id is gone, so a destroyed session is
    /// never re-created.
    async fn update(
        &self,
        id: &SessionId,
        state: &SessionState,
    ) -> Result<bool, SessionStoreError>;

    /// Restart the expiry of a session that is still present. Returns `false`
    /// when the id is gone.
    async fn touch(&self, id: &SessionId) -> Result<bool, SessionStoreError>;

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionStoreError>;

    /// Drop expired sessions. Backends that expire entries on their own keep
    /// the default.
    async fn purge_expired(&self) -> Result<usize, SessionStoreError> {
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy)]
struct StoredSession {
    state: SessionState,
    expires_at: Option<Instant>,
}

impl StoredSession {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process session store with optional expiry
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, StoredSession>,
    ttl: Option<Duration>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire sessions `ttl` after they were last written or touched
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn expiry(&self, now: Instant) -> Option<Instant> {
        self.ttl.map(|ttl| now + ttl)
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| !stored.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, SessionStoreError> {
        let now = Instant::now();
        if let Some(stored) = self.sessions.get(id).map(|entry| *entry) {
            if !stored.is_expired(now) {
                return Ok(Some(stored.state));
            }
            self.sessions.remove_if(id, |_, stored| stored.is_expired(now));
        }
        Ok(None)
    }

    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionStoreError> {
        let expires_at = self.expiry(Instant::now());
        self.sessions.insert(
            id.clone(),
            StoredSession {
                state: *state,
                expires_at,
            },
        );
        Ok(())
    }

    async fn update(
        &self,
        id: &SessionId,
        state: &SessionState,
    ) -> Result<bool, SessionStoreError> {
        let now = Instant::now();
        // shard stays write-locked until `stored` drops
        let Some(mut stored) = self.sessions.get_mut(id) else {
            return Ok(false);
        };
        if stored.is_expired(now) {
            return Ok(false);
        }
        stored.state = *state;
        stored.expires_at = self.expiry(now);
        Ok(true)
    }

    async fn touch(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        let now = Instant::now();
        let Some(mut stored) = self.sessions.get_mut(id) else {
            return Ok(false);
        };
        if stored.is_expired(now) {
            return Ok(false);
        }
        stored.expires_at = self.expiry(now);
        Ok(true)
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, SessionStoreError> {
        Ok(MemorySessionStore::purge_expired(self))
    }
}
