//! Session cookie parsing and formatting.

use axum::http::{header, HeaderMap};

use crate::auth::SessionId;
use crate::config::SessionConfig;

/// Find the session token among the request's `Cookie` headers.
///
/// The first non-empty value for `name` wins.
pub fn session_token(headers: &HeaderMap, name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| SessionId::from(value.trim_matches('"')))
}

/// `Set-Cookie` value that hands the client its session token.
pub fn session_cookie(config: &SessionConfig, id: &SessionId) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
        config.cookie_name,
        id.as_str(),
        secure_suffix(config)
    )
}

/// `Set-Cookie` value that makes the client drop its session token.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}",
        config.cookie_name,
        secure_suffix(config)
    )
}

fn secure_suffix(config: &SessionConfig) -> &'static str {
    if config.secure_cookie {
        "; Secure"
    } else {
        ""
    }
}
