//! Fixed-window rate limiting keyed by client IP

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::utils::errors::ApiError;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Key used for requests without connection info
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_after: Duration,
    },
    Limited {
        limit: u32,
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Counts requests per client within fixed windows.
///
/// Each check runs under the map's per-key lock, so concurrent requests from
/// one client never lose an increment.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    /// Record a request from `key` and decide whether it may proceed
    pub fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut window = self
            .windows
            .entry(key.to_string())
            .or_insert(Window {
                count: 0,
                started_at: now,
            });

        if now.duration_since(window.started_at) >= self.window {
            *window = Window {
                count: 0,
                started_at: now,
            };
        }

        let reset_after = self
            .window
            .saturating_sub(now.duration_since(window.started_at));

        if window.count >= self.max_requests {
            return RateDecision::Limited {
                limit: self.max_requests,
                retry_after: reset_after,
            };
        }

        window.count += 1;
        RateDecision::Allowed {
            limit: self.max_requests,
            remaining: self.max_requests - window.count,
            reset_after,
        }
    }

    /// Drop windows that have fully elapsed, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.started_at) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Peer IP of the request, or [`UNKNOWN_CLIENT`] without connection info
pub fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_millis().div_ceil(1000) as u64
}

fn insert_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: Duration) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(ceil_secs(reset_after)));
}

/// Rejects requests over quota before they reach session handling
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_ip(&request);

    match limiter.check(&key) {
        RateDecision::Allowed {
            limit,
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            insert_headers(response.headers_mut(), limit, remaining, reset_after);
            response
        }
        RateDecision::Limited { limit, retry_after } => {
            debug!(client = %key, "Rate limit exceeded");
            let mut response = ApiError::RateLimited {
                retry_after_secs: ceil_secs(retry_after).max(1),
            }
            .into_response();
            insert_headers(response.headers_mut(), limit, 0, retry_after);
            response
        }
    }
}
