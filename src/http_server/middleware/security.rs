//! Security headers middleware
//!
//! Adds hardened security headers to all HTTP responses to protect against
//! common web vulnerabilities.

use axum::{
    extract::{Request, State},
    http::header::{self, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const DEFAULT_CSP: &str = "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';\
script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';\
upgrade-insecure-requests";

/// 180 days, subdomains included
const DEFAULT_HSTS: &str = "max-age=15552000; includeSubDomains";

const POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Headers stamped onto every response
#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        let pairs: [(HeaderName, &'static str); 12] = [
            (header::CONTENT_SECURITY_POLICY, DEFAULT_CSP),
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                "same-origin",
            ),
            (
                HeaderName::from_static("cross-origin-resource-policy"),
                "same-origin",
            ),
            (HeaderName::from_static("origin-agent-cluster"), "?1"),
            (header::REFERRER_POLICY, "no-referrer"),
            (header::STRICT_TRANSPORT_SECURITY, DEFAULT_HSTS),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::X_DNS_PREFETCH_CONTROL, "off"),
            (HeaderName::from_static("x-download-options"), "noopen"),
            (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
            (
                HeaderName::from_static("x-permitted-cross-domain-policies"),
                "none",
            ),
            (header::X_XSS_PROTECTION, "0"),
        ];

        Self {
            headers: pairs
                .into_iter()
                .map(|(name, value)| (name, HeaderValue::from_static(value)))
                .collect(),
        }
    }
}

impl SecurityHeadersConfig {
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

/// Security headers middleware
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in config.headers() {
        headers.insert(name.clone(), value.clone());
    }
    headers.remove(POWERED_BY);

    response
}

/// Allow-all CORS policy
pub fn permissive_cors() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
