//! Authentication and session subsystem.
//!
//! # Data Flow
//! ```text
//! POST /login
//!     → credentials.rs (CredentialStore::validate)
//!     → gate.rs (authenticate: evict old session, mint new one)
//!     → store.rs (atomic replace in the session table)
//!
//! Every other request
//!     → gate.rs (authorize: token → live, unexpired session of a known principal)
//!     → Allow (handler runs) | Deny (redirect to /login)
//!
//! Background
//!     → sweeper.rs (periodic eviction of expired sessions)
//! ```
//!
//! # Design Decisions
//! - At most one live session per principal; a new login wins
//! - Session state is an injected `SessionStore`, never a global
//! - Sessions replaced by a newer login leave a tombstone so their next use
//!   reports `SessionInvalidated`

pub mod credentials;
pub mod error;
pub mod gate;
pub mod session;
pub mod store;
pub mod sweeper;

pub use credentials::{generated_user, CredentialStore, Credentials, MemoryCredentialStore};
pub use error::AuthError;
pub use gate::AccessGate;
pub use session::{InvalidationReason, Session, SessionId, SessionState};
pub use store::{MemorySessionStore, SessionStore};
pub use sweeper::SessionSweeper;
