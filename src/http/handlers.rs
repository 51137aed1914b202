//! Request handlers: the greeting, the login form and logout.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;

use crate::auth::Credentials;
use crate::http::cookie::{clear_session_cookie, session_cookie, session_token};
use crate::http::response::{redirect, redirect_with_cookie};
use crate::http::server::AppState;
use crate::security::access_control::UserContext;

pub const GREETING: &str = "Hello, World";

/// `GET /`: only reachable through the access gate.
pub async fn greeting(Extension(user): Extension<UserContext>) -> &'static str {
    tracing::debug!(
        principal = %user.principal,
        session_id = %user.session_id.redacted(),
        "Serving greeting"
    );
    GREETING
}

/// Which notice the login page shows. The flags carry no value (`/login?error`).
#[derive(Debug, Default, Deserialize)]
pub struct LoginNotice {
    error: Option<String>,
    logout: Option<String>,
    expired: Option<String>,
}

impl LoginNotice {
    fn message(&self) -> Option<&'static str> {
        if self.error.is_some() {
            Some("Invalid credentials")
        } else if self.expired.is_some() {
            Some("Your session has expired or was replaced by a newer login")
        } else if self.logout.is_some() {
            // Stock login-page notice for external links; /logout itself lands on "/"
            Some("You have been signed out")
        } else {
            None
        }
    }
}

/// `GET /login`
pub async fn login_page(Query(notice): Query<LoginNotice>) -> Html<String> {
    Html(render_login_page(notice.message()))
}

fn render_login_page(notice: Option<&str>) -> String {
    let notice = notice
        .map(|msg| format!("<p class=\"notice\">{}</p>\n", msg))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Please sign in</title></head>
<body>
<h1>Please sign in</h1>
{notice}<form method="post" action="/login">
<p><label for="username">Username</label> <input type="text" id="username" name="username" required autofocus></p>
<p><label for="password">Password</label> <input type="password" id="password" name="password" required></p>
<button type="submit">Sign in</button>
</form>
</body>
</html>
"#
    )
}

/// `POST /login`: success lands on `/` with a fresh session cookie; failure
/// re-prompts via `/login?error`.
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(credentials): Form<Credentials>,
) -> Response {
    let policy = state.gate.policy();
    let presented = session_token(&headers, &policy.cookie_name);

    match state.gate.sign_in(&credentials, presented.as_ref()) {
        Ok(session) => redirect_with_cookie("/", session_cookie(&policy, &session.id)),
        Err(err) => redirect(err.login_redirect()),
    }
}

/// `POST /logout` (and `GET`): always succeeds and lands on `/`.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let policy = state.gate.policy();
    let presented = session_token(&headers, &policy.cookie_name);
    state.gate.logout(presented.as_ref());
    redirect_with_cookie("/", clear_session_cookie(&policy))
}

/// Authenticated requests for anything but `/`.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_selection() {
        let notice = |error: bool, logout: bool, expired: bool| LoginNotice {
            error: error.then(String::new),
            logout: logout.then(String::new),
            expired: expired.then(String::new),
        };
        assert_eq!(notice(false, false, false).message(), None);
        assert_eq!(notice(true, false, false).message(), Some("Invalid credentials"));
        assert_eq!(
            notice(false, true, false).message(),
            Some("You have been signed out")
        );
        assert!(notice(false, false, true).message().unwrap().contains("expired"));
    }

    #[test]
    fn test_login_page_has_form_fields() {
        let page = render_login_page(Some("Invalid credentials"));
        assert!(page.contains(r#"name="username""#));
        assert!(page.contains(r#"name="password""#));
        assert!(page.contains(r#"action="/login""#));
        assert!(page.contains("Invalid credentials"));
        assert!(!render_login_page(None).contains("class=\"notice\""));
    }
}
