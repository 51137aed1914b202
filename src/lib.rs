//! Session gate library.
//!
//! A form-login access gate with one live session per principal, in front of
//! a single greeting endpoint.

// Core subsystems
pub mod auth;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use auth::{AccessGate, AuthError};
pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
