//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (session required, except /login and /logout)
//!     → handler
//! Outgoing response:
//!     → headers.rs (cache-control and hardening headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: no session, no handler
//! - Denials are redirects to the login form, never error pages
//! - No CSRF tokens; the session cookie is `SameSite=Lax`

pub mod access_control;
pub mod headers;

pub use access_control::{access_gate_middleware, UserContext};
pub use headers::with_security_headers;
