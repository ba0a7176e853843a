//! Structured access log
//!
//! Emits one event per request after the response is produced, whatever the
//! outcome. The event level follows the status class: 5xx is `error`, 4xx is
//! `warn`, everything else `info`.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Level;

use crate::http_server::middleware::rate_limit::client_ip;

/// Target shared by every access record
pub const ACCESS_LOG_TARGET: &str = "bike_price_api::access";

macro_rules! access_event {
    ($level:expr, $method:expr, $uri:expr, $status:expr, $latency_ms:expr, $client_ip:expr) => {
        tracing::event!(
            target: ACCESS_LOG_TARGET,
            $level,
            method = %$method,
            path = %$uri.path(),
            status = $status,
            latency_ms = $latency_ms,
            client_ip = %$client_ip,
            "HTTP {} {} {} {}ms",
            $method,
            $uri,
            $status,
            $latency_ms
        )
    };
}

pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = client_ip(&request);
    let start = Instant::now();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    match status {
        500..=u16::MAX => access_event!(Level::ERROR, method, uri, status, latency_ms, client_ip),
        400..=499 => access_event!(Level::WARN, method, uri, status, latency_ms, client_ip),
        _ => access_event!(Level::INFO, method, uri, status, latency_ms, client_ip),
    }

    response
}
