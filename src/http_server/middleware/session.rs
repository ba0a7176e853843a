//! Session middleware
//!
//! Resolves the session named by the signed cookie (or starts a new one),
//! exposes it to handlers through request extensions, and persists it once the
//! handler has produced a response.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::session::cookie::find_cookie;
use crate::session::{
    CookieSettings, CookieSigner, Session, SessionId, SessionStore, SessionStoreError,
};
use crate::utils::errors::ApiError;

/// Everything the session middleware needs
pub struct SessionLayerState {
    pub store: Arc<dyn SessionStore>,
    pub signer: CookieSigner,
    pub cookie: CookieSettings,
}

impl SessionLayerState {
    pub fn new(config: &SessionConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            signer: CookieSigner::new(&config.secret),
            cookie: CookieSettings {
                name: config.cookie_name.clone(),
                secure: config.secure,
                max_age_secs: config.ttl_secs,
            },
        }
    }

    /// Load the session named by the request cookie, or start a fresh one.
    ///
    /// Unsigned, forged or unknown ids all lead to a new anonymous session.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Session, SessionStoreError> {
        let id = find_cookie(headers, &self.cookie.name)
            .and_then(|value| self.signer.unsign(&value))
            .map(SessionId::from);

        if let Some(id) = id {
            if let Some(state) = self.store.load(&id).await? {
                return Ok(Session::existing(id, state, self.store.clone()));
            }
            debug!("Session id not found in store, starting a new session");
        }

        Ok(Session::fresh(self.store.clone()))
    }

    fn cookie_header(&self, session: &Session) -> String {
        let cookie = if session.is_destroyed() {
            self.cookie.clear_cookie()
        } else {
            self.cookie.set_cookie(self.signer.sign(session.id().as_str()))
        };
        cookie.to_string()
    }
}

pub async fn session_middleware(
    State(state): State<Arc<SessionLayerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = state.resolve(request.headers()).await?;
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    session.commit().await?;

    match HeaderValue::from_str(&state.cookie_header(&session)) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Session cookie is not a valid header value"),
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionState};

    fn layer_state(store: Arc<MemorySessionStore>) -> SessionLayerState {
        let config = SessionConfig {
            secret: "keyboard cat".to_string(),
            ..Default::default()
        };
        SessionLayerState::new(&config, store)
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("connect.sid={value}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_resolve_without_cookie_starts_fresh() {
        let state = layer_state(Arc::new(MemorySessionStore::new()));
        let session = state.resolve(&HeaderMap::new()).await.unwrap();
        assert!(session.is_new());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_resolve_known_session() {
        let store = Arc::new(MemorySessionStore::new());
        let id = SessionId::generate();
        store
            .save(&id, &SessionState { authenticated: true })
            .await
            .unwrap();
        let state = layer_state(store);

        let headers = cookie_headers(&state.signer.sign(id.as_str()));
        let session = state.resolve(&headers).await.unwrap();

        assert_eq!(session.id(), id);
        assert!(!session.is_new());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_resolve_rejects_forged_cookie() {
        let store = Arc::new(MemorySessionStore::new());
        let id = SessionId::generate();
        store
            .save(&id, &SessionState { authenticated: true })
            .await
            .unwrap();
        let state = layer_state(store);

        let forged = CookieSigner::new("not the secret").sign(id.as_str());
        let session = state.resolve(&cookie_headers(&forged)).await.unwrap();

        assert_ne!(session.id(), id);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_starts_fresh() {
        let state = layer_state(Arc::new(MemorySessionStore::new()));
        let stale = state.signer.sign("gone");

        let session = state.resolve(&cookie_headers(&stale)).await.unwrap();
        assert!(session.is_new());
        assert_ne!(session.id().as_str(), "gone");
    }
}
