//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → security::access_control (session check or redirect to /login)
//!     → handlers.rs (greeting, login form, logout)
//!     → response.rs / cookie.rs (302 redirects, Set-Cookie)
//!     → security::headers (hardening headers)
//!     → Send to client
//! ```

pub mod cookie;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::GREETING;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
