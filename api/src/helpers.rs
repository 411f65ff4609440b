//! Shared helpers for cache age checks and the session cookie.
//!
//! Both staleness checks in the service compare whole elapsed seconds, but
//! they differ at the boundary:
//!
//! - lookups are reused while `age < ttl` (strict)
//! - forecasts are reused while `age <= ttl` (inclusive)

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Lifetime of the session cookie, matching a "permanent" browser session.
pub(crate) const SESSION_COOKIE_MAX_AGE_SECS: i64 = 31 * 24 * 3600;

/// Whole seconds elapsed between `then` and `now`.
///
/// A timestamp in the future yields a negative age, which every caller treats
/// as fresh.
pub(crate) fn age_secs(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds()
}

/// True when `then` is strictly younger than `ttl_secs`.
pub(crate) fn younger_than(then: DateTime<Utc>, now: DateTime<Utc>, ttl_secs: i64) -> bool {
    age_secs(then, now) < ttl_secs
}

/// True when `then` is at most `ttl_secs` old.
pub(crate) fn at_most(then: DateTime<Utc>, now: DateTime<Utc>, ttl_secs: i64) -> bool {
    age_secs(then, now) <= ttl_secs
}

/// Extract the session id from the request's `Cookie` headers.
///
/// Returns `None` when the cookie is missing or does not hold a UUID, in
/// which case the caller starts a fresh session.
pub(crate) fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Build the `Set-Cookie` value that pins a client to its session.
pub(crate) fn session_cookie(cookie_name: &str, id: Uuid) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        cookie_name, id, SESSION_COOKIE_MAX_AGE_SECS
    )
}
