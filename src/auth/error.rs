//! Authentication failures.
//!
//! Every variant is recoverable: the HTTP layer turns each one into a
//! redirect to the login form via [`AuthError::login_redirect`].

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username unknown or password mismatch.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The session outlived its idle timeout or absolute lifetime.
    #[error("session expired")]
    SessionExpired,
    /// The session was logged out, replaced by a newer login, or its
    /// principal no longer exists.
    #[error("session invalidated")]
    SessionInvalidated,
    /// The request carried no session token.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// Where a browser hitting this error is sent.
    pub fn login_redirect(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "/login?error",
            AuthError::SessionExpired | AuthError::SessionInvalidated => "/login?expired",
            AuthError::NotAuthenticated => "/login",
        }
    }

    /// True when the client holds a token that should be cleared.
    pub fn has_stale_token(&self) -> bool {
        matches!(self, AuthError::SessionExpired | AuthError::SessionInvalidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_redirects_to_login() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::SessionExpired,
            AuthError::SessionInvalidated,
            AuthError::NotAuthenticated,
        ] {
            assert!(err.login_redirect().starts_with("/login"), "{}", err);
        }
    }

    #[test]
    fn test_stale_token_only_for_dead_sessions() {
        assert!(AuthError::SessionExpired.has_stale_token());
        assert!(AuthError::SessionInvalidated.has_stale_token());
        assert!(!AuthError::NotAuthenticated.has_stale_token());
        assert!(!AuthError::InvalidCredentials.has_stale_token());
    }
}
