//! HTTP server middleware

pub mod access_log;
pub mod auth;
pub mod rate_limit;
pub mod security;
pub mod session;
pub mod timing;

pub use access_log::{access_log_middleware, ACCESS_LOG_TARGET};
pub use auth::require_authenticated;
pub use rate_limit::{client_ip, rate_limit_middleware, RateDecision, RateLimiter};
pub use security::{permissive_cors, security_headers_middleware, SecurityHeadersConfig};
pub use session::{session_middleware, SessionLayerState};
pub use timing::{response_time_middleware, RESPONSE_TIME_HEADER};
