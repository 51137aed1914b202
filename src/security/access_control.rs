//! Access gate middleware.
//! Enforces an authenticated session on every route but the login surface.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::auth::SessionId;
use crate::http::cookie::{clear_session_cookie, session_token};
use crate::http::response::{redirect, redirect_with_cookie};
use crate::http::server::AppState;

/// Routes reachable without a session.
pub const PUBLIC_PATHS: [&str; 2] = ["/login", "/logout"];

/// Context attached to authenticated requests.
#[derive(Clone, Debug)]
pub struct UserContext {
    pub principal: String,
    pub session_id: SessionId,
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

pub async fn access_gate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // 1. The login form and logout must work without a session.
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    // 2. Extract the session token from the cookie
    let policy = state.gate.policy();
    let presented = session_token(req.headers(), &policy.cookie_name);

    // 3. Ask the gate
    match state.gate.authorize(presented.as_ref()) {
        Ok(session) => {
            req.extensions_mut().insert(UserContext {
                principal: session.principal,
                session_id: session.id,
            });
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(
                path = %req.uri().path(),
                reason = %err,
                "Request denied, redirecting to login"
            );
            if err.has_stale_token() {
                redirect_with_cookie(err.login_redirect(), clear_session_cookie(&policy))
            } else {
                redirect(err.login_redirect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public("/login"));
        assert!(is_public("/logout"));
        assert!(!is_public("/"));
        assert!(!is_public("/login/extra"));
        assert!(!is_public("/anything"));
    }
}
