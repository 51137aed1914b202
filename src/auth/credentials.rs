//! Credential validation.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::UserConfig;

/// A login attempt as submitted by the form.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Source of truth for which principals exist and what their passwords are.
pub trait CredentialStore: Send + Sync {
    /// Returns true if `password` is the credential of `username`.
    fn validate(&self, username: &str, password: &str) -> bool;

    /// Returns true if `username` is a known principal.
    fn contains(&self, username: &str) -> bool;
}

/// In-memory credential store fed from configuration.
///
/// The user table is swapped as a whole on reload, so readers never see a
/// half-applied update.
pub struct MemoryCredentialStore {
    users: ArcSwap<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new(users: &[UserConfig]) -> Self {
        Self {
            users: ArcSwap::from_pointee(build_table(users)),
        }
    }

    /// Replace the whole user table.
    pub fn replace(&self, users: &[UserConfig]) {
        self.users.store(Arc::new(build_table(users)));
        tracing::info!(users = users.len(), "Credential store reloaded");
    }

    pub fn len(&self) -> usize {
        self.users.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.load().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn validate(&self, username: &str, password: &str) -> bool {
        match self.users.load().get(username) {
            Some(expected) => constant_time_eq(expected.as_bytes(), password.as_bytes()),
            None => false,
        }
    }

    fn contains(&self, username: &str) -> bool {
        self.users.load().contains_key(username)
    }
}

fn build_table(users: &[UserConfig]) -> HashMap<String, String> {
    users
        .iter()
        .map(|u| (u.username.clone(), u.password.clone()))
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// The fallback principal used when no users are configured.
///
/// The password is random per process; callers are expected to log it once.
pub fn generated_user() -> UserConfig {
    UserConfig {
        username: "user".to_string(),
        password: Uuid::new_v4().to_string(),
    }
}
