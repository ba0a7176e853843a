//! Authentication guard for protected routes

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::debug;

use crate::session::Session;
use crate::utils::errors::ApiError;

/// Lets the request through only when the session is authenticated.
///
/// Runs after the session middleware; the handler is never invoked for an
/// anonymous session.
pub async fn require_authenticated(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !session.is_authenticated() {
        debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
