use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::config::CookieConfig;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Build the cookie that carries a freshly minted session token.
pub fn session_cookie(token: String, cfg: &CookieConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(cfg.max_age_days))
        .build()
}

/// Build an already-expired cookie so the browser drops the session.
///
/// Client-side erasure only: a token copied out of the cookie stays
/// valid until its natural expiry.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
