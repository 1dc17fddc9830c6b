//! Session cookie construction.
//!
//! Cookie attributes come from the immutable [`CookieConfig`] built at
//! startup. The session cookie is always HttpOnly; scripts never read it.

use axum::http::{header::InvalidHeaderValue, HeaderValue};

use crate::config::CookieConfig;

/// `Set-Cookie` value installing the session token.
pub fn session_cookie(
    config: &CookieConfig,
    token: &str,
    max_age_secs: u64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite={}",
        config.name, token, config.path, max_age_secs, config.same_site
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value clearing the session cookie.
pub fn clear_session_cookie(config: &CookieConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; HttpOnly; SameSite={}",
        config.name, config.path, config.same_site
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
