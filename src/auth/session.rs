//! Session records.
//!
//! # States
//! ```text
//! (no session) → Active        on successful login
//! Active       → Invalidated   on logout, replacement, expiry, principal removal
//! ```
//! `Invalidated` is terminal; a new login always mints a fresh [`SessionId`].

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::config::SessionConfig;

/// Seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Opaque session token as carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a new unguessable token (122 random bits).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to put in logs.
    pub fn redacted(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl From<&str> for SessionId {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for SessionId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Why a session stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    Logout,
    /// A newer login for the same principal took over.
    Replaced,
    Expired,
    PrincipalRemoved,
    /// The session a successful login arrived with.
    Fixation,
}

impl InvalidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationReason::Logout => "logout",
            InvalidationReason::Replaced => "replaced",
            InvalidationReason::Expired => "expired",
            InvalidationReason::PrincipalRemoved => "principal_removed",
            InvalidationReason::Fixation => "fixation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Invalidated(InvalidationReason),
}

/// Server-side record of one authenticated login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub principal: String,
    /// Seconds since epoch.
    pub created_at: u64,
    /// Seconds since epoch; refreshed on every authorized request.
    pub last_accessed_at: u64,
    pub state: SessionState,
}

impl Session {
    pub fn new(principal: impl Into<String>, now: u64) -> Self {
        Self {
            id: SessionId::generate(),
            principal: principal.into(),
            created_at: now,
            last_accessed_at: now,
            state: SessionState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// True once idle time or total age exceeds the policy at `now`.
    pub fn is_expired(&self, policy: &SessionConfig, now: u64) -> bool {
        let idle = now.saturating_sub(self.last_accessed_at);
        if idle > policy.idle_timeout_secs {
            return true;
        }
        match policy.max_lifetime_secs {
            Some(max) => now.saturating_sub(self.created_at) > max,
            None => false,
        }
    }

    pub fn invalidate(&mut self, reason: InvalidationReason) {
        self.state = SessionState::Invalidated(reason);
    }
}
