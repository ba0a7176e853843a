//! Server-side sessions
//!
//! Sessions are keyed by an opaque id carried in a signed cookie. The id maps to
//! a [`SessionState`] held by a [`SessionStore`]; handlers see a per-request
//! [`Session`] handle installed by the session middleware.

pub mod cookie;
pub mod handle;
pub mod store;

pub use cookie::{CookieSettings, CookieSigner};
pub use handle::Session;
pub use store::{MemorySessionStore, SessionId, SessionState, SessionStore, SessionStoreError};
