pub mod assignments;
pub mod auth;
pub mod courses;
pub mod leaderboard;
pub mod ledger_push;
pub mod students;
pub mod submissions;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "session";

/// Returns the caller's session id, minting one (and setting the cookie)
/// on first contact. Credential storage is keyed by this id.
pub fn ensure_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_string();
        if !id.is_empty() {
            return (jar, id);
        }
    }
    let id = Uuid::new_v4().to_string();
    let jar = jar.add(Cookie::new(SESSION_COOKIE, id.clone()));
    (jar, id)
}

pub fn require(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::missing_param(name))
}
