//! Session cookie handling

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use session_store::SessionId;

use crate::config::SessionConfig;

/// Name and attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.trim(), config.secure_cookies)
    }

    /// Session identifier sent by the browser, if any.
    pub fn read(&self, jar: &CookieJar) -> Option<SessionId> {
        jar.get(&self.name)
            .and_then(|cookie| SessionId::parse(cookie.value()))
    }

    /// Jar carrying a cookie for `id`.
    pub fn issue(&self, jar: CookieJar, id: &SessionId) -> CookieJar {
        jar.add(
            Cookie::build((self.name.clone(), id.as_str().to_owned()))
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(self.secure)
                .path("/"),
        )
    }
}
