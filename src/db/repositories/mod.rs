//! Repository layer
//!
//! Trait-based data access over the SQLite store, so services depend on the
//! `SessionRepository` interface rather than on SQLx directly.

mod session;

pub use session::{SessionRepository, SqlxSessionRepository};
