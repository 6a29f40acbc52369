//! One-shot status messages carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const FLASH_COOKIE: &str = "shelter_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }

    fn encode(&self) -> Option<String> {
        let json = serde_json::to_string(self).ok()?;
        Some(utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string())
    }

    fn decode(raw: &str) -> Option<Self> {
        let json = percent_decode_str(raw).decode_utf8().ok()?;
        serde_json::from_str(&json).ok()
    }
}

/// Queue a message for the next rendered page. A later call replaces it.
pub fn push_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    let Some(value) = flash.encode() else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Consume the pending message, if any, clearing the cookie.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_owned()) else {
        return (jar, None);
    };
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, Flash::decode(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_survives_cookie_encoding() {
        let jar = push_flash(CookieJar::new(), Flash::success("Тварину \"Рекс\" додано; ok"));
        let raw = jar.get(FLASH_COOKIE).unwrap().value().to_owned();
        assert!(raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '%'));

        let (jar, flash) = take_flash(jar);
        let flash = flash.unwrap();
        assert_eq!(flash.level, FlashLevel::Success);
        assert_eq!(flash.message, "Тварину \"Рекс\" додано; ok");
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn missing_or_garbled_flash_yields_none() {
        let (_, flash) = take_flash(CookieJar::new());
        assert!(flash.is_none());
        assert!(Flash::decode("%7Bnot-json").is_none());
    }
}
