//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. Validation is a pure
//! function over [`GateConfig`] and reports every problem, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GateConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("session.cookie_name '{0}' is not a valid cookie name")]
    InvalidCookieName(String),
    #[error("users[{0}]: username must not be empty")]
    EmptyUsername(usize),
    #[error("users[{index}] ({username}): password must not be empty")]
    EmptyPassword { index: usize, username: String },
    #[error("users: duplicate username '{0}'")]
    DuplicateUsername(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let session = &config.session;
    if !is_cookie_token(&session.cookie_name) {
        errors.push(ValidationError::InvalidCookieName(session.cookie_name.clone()));
    }
    if session.idle_timeout_secs == 0 {
        errors.push(ValidationError::Zero("session.idle_timeout_secs"));
    }
    if session.max_lifetime_secs == Some(0) {
        errors.push(ValidationError::Zero("session.max_lifetime_secs"));
    }
    if session.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("session.sweep_interval_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    let mut seen = HashSet::new();
    for (index, user) in config.users.iter().enumerate() {
        if user.username.is_empty() {
            errors.push(ValidationError::EmptyUsername(index));
            continue;
        }
        if user.password.is_empty() {
            errors.push(ValidationError::EmptyPassword {
                index,
                username: user.username.clone(),
            });
        }
        if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::DuplicateUsername(user.username.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RFC 6265 cookie-name: a non-empty HTTP token.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
