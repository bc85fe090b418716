//! Cookie-backed sessions.
//!
//! A session is an opaque id stored in the `postbox_session` cookie. It holds
//! at most one registered identity.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "postbox_session";

/// Longest accepted session id.
const MAX_SESSION_ID_LENGTH: usize = 64;

/// Session id carried by the request, if it has a well-formed one.
pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| is_valid_session_id(id))
}

/// Draw a fresh session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Cookie carrying `id`.
pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LENGTH
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
