//! Shared helpers for driving the router in-process

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response};
use axum::Router;
use bike_price_api::config::{Config, RateLimitConfig, SessionConfig};
use bike_price_api::http_server::{create_router, AppState};
use bike_price_api::session::MemorySessionStore;
use bike_price_api::store::{ListingStore, MemoryListingStore};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        session: SessionConfig {
            secret: SECRET.to_string(),
            ..Default::default()
        },
        rate_limit: RateLimitConfig {
            window_ms: 60_000,
            max_requests: 1_000,
            cleanup_interval_secs: 60,
        },
        ..Default::default()
    }
}

pub fn listings(documents: Value) -> Arc<MemoryListingStore> {
    Arc::new(MemoryListingStore::from_json_str(&documents.to_string()).unwrap())
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    pub fn new(config: &Config, listings: Arc<dyn ListingStore>) -> Self {
        let sessions = Arc::new(MemorySessionStore::new());
        let state = Arc::new(AppState::new(config, listings, sessions.clone()));
        Self {
            router: create_router(state.clone()),
            state,
            sessions,
        }
    }

    pub fn with_listings(documents: Value) -> Self {
        Self::new(&test_config(), listings(documents))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(get(uri)).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Request that appears to come from `ip`
pub fn get_from(uri: &str, ip: [u8; 4]) -> Request<Body> {
    let mut request = get(uri);
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 40_000))));
    request
}

/// Full `Set-Cookie` header value, if any
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `name=value` pair to send back in a `Cookie` header
pub fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = set_cookie(response).expect("response has no Set-Cookie header");
    set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim()
        .to_string()
}

pub fn header_str<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
