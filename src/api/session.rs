//! Session cookie handling.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};

use crate::services::auth_service::SessionToken;

pub const SESSION_COOKIE: &str = "shelter_session";

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

pub fn set_session_cookie(jar: CookieJar, session: SessionToken, secure: bool) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .max_age(max_age_until(session.expires_at))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn max_age_until(expires_at: DateTime<Utc>) -> time::Duration {
    let secs = (expires_at - Utc::now()).num_seconds().max(0);
    time::Duration::seconds(secs)
}
