//! The access gate: authentication, authorization and logout.
//!
//! Every decision goes through here; the HTTP middleware only translates
//! cookies in and redirects out. Methods without the `_at` suffix read the
//! wall clock, the `_at` variants take `now` (seconds since epoch) so the
//! policy can be exercised without sleeping.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::auth::credentials::{CredentialStore, Credentials};
use crate::auth::error::AuthError;
use crate::auth::session::{now_secs, InvalidationReason, Session, SessionId, SessionState};
use crate::auth::store::SessionStore;
use crate::config::SessionConfig;
use crate::observability::metrics;

pub struct AccessGate {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    policy: ArcSwap<SessionConfig>,
}

impl AccessGate {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        policy: SessionConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            policy: ArcSwap::from_pointee(policy),
        }
    }

    /// The session policy currently in force.
    pub fn policy(&self) -> Arc<SessionConfig> {
        self.policy.load_full()
    }

    /// Swap the session policy; live sessions are kept and judged by the new one.
    pub fn update_policy(&self, policy: SessionConfig) {
        tracing::info!(
            idle_timeout_secs = policy.idle_timeout_secs,
            max_lifetime_secs = ?policy.max_lifetime_secs,
            "Session policy updated"
        );
        self.policy.store(Arc::new(policy));
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.authenticate_at(credentials, now_secs())
    }

    /// Validate credentials and open a fresh session.
    ///
    /// A previous live session of the same principal is evicted; an existing
    /// session never blocks a login. Failures leave no state behind.
    pub fn authenticate_at(&self, credentials: &Credentials, now: u64) -> Result<Session, AuthError> {
        if !self
            .credentials
            .validate(&credentials.username, &credentials.password)
        {
            tracing::warn!(principal = %credentials.username, "Login failed: invalid credentials");
            metrics::record_login(false);
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session::new(credentials.username.clone(), now);
        if let Some(evicted) = self.sessions.insert_replacing(session.clone()) {
            tracing::info!(
                principal = %session.principal,
                evicted = %evicted.id.redacted(),
                "Previous session replaced by new login"
            );
            metrics::record_session_invalidated(InvalidationReason::Replaced.as_str());
        }

        tracing::info!(
            principal = %session.principal,
            session_id = %session.id.redacted(),
            "Login succeeded"
        );
        metrics::record_login(true);
        metrics::record_active_sessions(self.sessions.live_count());
        Ok(session)
    }

    pub fn sign_in(
        &self,
        credentials: &Credentials,
        presented: Option<&SessionId>,
    ) -> Result<Session, AuthError> {
        self.sign_in_at(credentials, presented, now_secs())
    }

    /// [`authenticate_at`](Self::authenticate_at) plus session-fixation
    /// protection: on success, the session the request arrived with is
    /// discarded instead of being carried over.
    pub fn sign_in_at(
        &self,
        credentials: &Credentials,
        presented: Option<&SessionId>,
        now: u64,
    ) -> Result<Session, AuthError> {
        let session = self.authenticate_at(credentials, now)?;
        if let Some(previous) = presented {
            if *previous != session.id {
                self.end_session(previous, InvalidationReason::Fixation);
            }
        }
        Ok(session)
    }

    pub fn authorize(&self, presented: Option<&SessionId>) -> Result<Session, AuthError> {
        self.authorize_at(presented, now_secs())
    }

    /// Decide whether a request carrying `presented` may proceed.
    ///
    /// Allowed only for a live, unexpired session whose principal still
    /// exists. Dead sessions found here are removed on the spot.
    pub fn authorize_at(&self, presented: Option<&SessionId>, now: u64) -> Result<Session, AuthError> {
        let decision = self.decide(presented, now);
        metrics::record_request(decision.is_ok());
        decision
    }

    fn decide(&self, presented: Option<&SessionId>, now: u64) -> Result<Session, AuthError> {
        let id = presented.ok_or(AuthError::NotAuthenticated)?;
        let mut session = self.sessions.get(id).ok_or(AuthError::SessionInvalidated)?;

        if let SessionState::Invalidated(reason) = session.state {
            // Tombstones only exist to report why; one report is enough
            self.sessions.remove(id);
            tracing::debug!(
                principal = %session.principal,
                session_id = %id.redacted(),
                reason = reason.as_str(),
                "Rejected invalidated session"
            );
            return Err(AuthError::SessionInvalidated);
        }

        if session.is_expired(&self.policy.load(), now) {
            self.end_session(id, InvalidationReason::Expired);
            return Err(AuthError::SessionExpired);
        }

        if !self.credentials.contains(&session.principal) {
            self.end_session(id, InvalidationReason::PrincipalRemoved);
            return Err(AuthError::SessionInvalidated);
        }

        if !self.sessions.touch(id, now) {
            // Lost a race with logout or a newer login
            return Err(AuthError::SessionInvalidated);
        }
        session.last_accessed_at = session.last_accessed_at.max(now);
        Ok(session)
    }

    /// Invalidate the presented session. Unknown, expired or already
    /// invalidated sessions are ignored.
    pub fn logout(&self, presented: Option<&SessionId>) {
        if let Some(id) = presented {
            self.end_session(id, InvalidationReason::Logout);
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(now_secs())
    }

    /// Remove expired sessions and tombstones whose window has passed.
    pub fn sweep_at(&self, now: u64) -> usize {
        let policy = self.policy.load_full();
        let removed = self
            .sessions
            .remove_where(&|s: &Session| s.is_expired(&policy, now));

        for session in removed.iter().filter(|s| s.is_active()) {
            tracing::info!(
                principal = %session.principal,
                session_id = %session.id.redacted(),
                "Session expired"
            );
            metrics::record_session_invalidated(InvalidationReason::Expired.as_str());
        }
        metrics::record_active_sessions(self.sessions.live_count());
        removed.len()
    }

    fn end_session(&self, id: &SessionId, reason: InvalidationReason) {
        let Some(session) = self.sessions.remove(id) else {
            return;
        };
        if session.is_active() {
            tracing::info!(
                principal = %session.principal,
                session_id = %id.redacted(),
                reason = reason.as_str(),
                "Session invalidated"
            );
            metrics::record_session_invalidated(reason.as_str());
            metrics::record_active_sessions(self.sessions.live_count());
        }
    }
}
