//! Per-request session handle
use axum::{extract::FromRequestParts, http::request::Parts};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::session::store::{SessionId, SessionState, SessionStore, SessionStoreError};
use crate::utils::errors::ApiError;

#[derive(Debug)]
struct SessionInner {
    id: SessionId,
    state: SessionState,
    is_new: bool,
    modified: bool,
    destroyed: bool,
}

/// Mutable view of the current request's session.
///
/// Cloning shares the same underlying session; the session middleware keeps
/// one clone and writes any changes back once the handler has finished.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Session that was just created and has never been stored
    pub fn fresh(store: Arc<dyn SessionStore>) -> Self {
        Self::build(SessionId::generate(), SessionState::default(), true, store)
    }

    /// Session loaded from the store
    pub fn existing(id: SessionId, state: SessionState, store: Arc<dyn SessionStore>) -> Self {
        Self::build(id, state, false, store)
    }

    fn build(
        id: SessionId,
        state: SessionState,
        is_new: bool,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                id,
                state,
                is_new,
                modified: false,
                destroyed: false,
            })),
            store,
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.lock().id.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().state.authenticated
    }

    pub fn is_new(&self) -> bool {
        self.inner.lock().is_new
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    /// Set the authenticated flag. Returns `true` if the value changed.
    pub fn set_authenticated(&self, authenticated: bool) -> bool {
        let mut inner = self.inner.lock();
        if inner.destroyed || inner.state.authenticated == authenticated {
            return false;
        }
        inner.state.authenticated = authenticated;
        inner.modified = true;
        true
    }

    /// Remove the session from the store. Completes only once the store has
    /// confirmed the removal; afterwards the handle is inert.
    pub async fn destroy(&self) -> Result<(), SessionStoreError> {
        let id = self.id();
        self.store.destroy(&id).await?;

        let mut inner = self.inner.lock();
        inner.destroyed = true;
        inner.state = SessionState::default();
        Ok(())
    }

    /// Write the session back to the store.
    ///
    /// New sessions are stored even when untouched, so a client that has
    /// received a cookie always has a matching entry. Existing sessions are
    /// only ever updated in place: if the entry was destroyed while this
    /// request ran, the handle becomes destroyed instead of re-creating it.
    /// Unchanged sessions have their expiry restarted.
    pub async fn commit(&self) -> Result<(), SessionStoreError> {
        let (id, state, is_new, modified) = {
            let inner = self.inner.lock();
            if inner.destroyed {
                return Ok(());
            }
            (inner.id.clone(), inner.state, inner.is_new, inner.modified)
        };

        let present = if is_new {
            self.store.save(&id, &state).await?;
            true
        } else if modified {
            self.store.update(&id, &state).await?
        } else {
            self.store.touch(&id).await?
        };

        let mut inner = self.inner.lock();
        if present {
            inner.is_new = false;
            inner.modified = false;
        } else {
            debug!("Session was destroyed before commit, dropping changes");
            inner.destroyed = true;
            inner.state = SessionState::default();
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("session middleware not installed".to_string()))
    }
}
