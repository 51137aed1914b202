//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the session gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Session lifecycle policy.
    pub session: SessionConfig,

    /// Principals accepted by the in-memory credential store.
    pub users: Vec<UserConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Session policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token.
    pub cookie_name: String,

    /// Idle time after which a session expires, in seconds.
    pub idle_timeout_secs: u64,

    /// Absolute lifetime of a session regardless of activity, in seconds.
    pub max_lifetime_secs: Option<u64>,

    /// How often the background sweeper evicts expired sessions, in seconds.
    pub sweep_interval_secs: u64,

    /// Mark the session cookie `Secure` (only sent over HTTPS).
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "SESSION".to_string(),
            idle_timeout_secs: 30 * 60,
            max_lifetime_secs: None,
            sweep_interval_secs: 60,
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// A principal and its credential.
///
/// Passwords are compared as stored; hashing is left to an external store.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Attach cache-control and browser hardening headers to every response.
    pub enable_headers: bool,
    /// Maximum request body size in bytes (login form submissions).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 16 * 1024, // 16KB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GateConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.session.cookie_name, "SESSION");
        assert_eq!(config.session.idle_timeout_secs, 1800);
        assert!(config.session.max_lifetime_secs.is_none());
        assert!(config.users.is_empty());
        assert!(config.security.enable_headers);
    }

    #[test]
    fn test_parse_users_and_session() {
        let config: GateConfig = toml::from_str(
            r#"
            [session]
            cookie_name = "GATE"
            idle_timeout_secs = 60
            max_lifetime_secs = 3600

            [[users]]
            username = "alice"
            password = "wonderland"

            [[users]]
            username = "bob"
            password = "builder"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.cookie_name, "GATE");
        assert_eq!(config.session.max_lifetime_secs, Some(3600));
        // Unset fields in a partial section keep their defaults
        assert_eq!(config.session.sweep_interval_secs, 60);
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[1].username, "bob");
    }

    #[test]
    fn test_user_debug_hides_password() {
        let user = UserConfig {
            username: "alice".into(),
            password: "wonderland".into(),
        };
        let printed = format!("{:?}", user);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("wonderland"));
    }
}
