//! Response time header
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::time::Instant;

pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Adds `X-Response-Time: <ms>ms` to every response
pub async fn response_time_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}ms", elapsed_ms)) {
        response.headers_mut().insert(RESPONSE_TIME_HEADER, value);
    }

    response
}
