//! Database layer
//!
//! The durable store for the ledger is a single SQLite file, created on
//! first start and migrated with embedded code-based migrations.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
