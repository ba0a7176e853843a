//! Signed session cookies
//!
//! Cookie values take the form `s:<id>.<signature>`, where the signature is the
//! unpadded base64 HMAC-SHA256 of the id under the configured secret.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_PREFIX: &str = "s:";
const ENCODED_SIGNED_PREFIX: &str = "s%3A";

/// Signs and verifies session ids
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        let mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key size");
        Self { mac }
    }

    /// Produce the cookie value for a session id
    pub fn sign(&self, id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        let signature = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{SIGNED_PREFIX}{id}.{signature}")
    }

    /// Recover the session id from a cookie value, or `None` if the value is
    /// malformed or the signature does not verify.
    pub fn unsign(&self, value: &str) -> Option<String> {
        let payload = value
            .strip_prefix(SIGNED_PREFIX)
            .or_else(|| value.strip_prefix(ENCODED_SIGNED_PREFIX))?;
        let (id, signature) = payload.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let signature = STANDARD_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }
}

/// Value of the named cookie across all `Cookie` headers
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// Attributes applied to the session cookie
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: Option<u64>,
}

impl CookieSettings {
    /// Session cookie carrying `value`
    pub fn set_cookie(&self, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        if let Some(max_age) = self.max_age_secs {
            let seconds = i64::try_from(max_age).unwrap_or(i64::MAX);
            builder = builder.max_age(CookieDuration::seconds(seconds));
        }
        builder.build()
    }

    /// Cookie that removes the session cookie from the client
    pub fn clear_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.set_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}
