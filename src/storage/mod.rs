//! Storage module
//!
//! Provides the SQLite database wrapper, schema, and the XP record store.

pub mod database;
pub mod schema;
pub mod xp_store;

// Re-export commonly used types
pub use database::{Database, DatabaseError};
pub use xp_store::{
    ActivityEvent, ActivityKind, ReconcileWrite, StoreError, WalletBinding, XpRecord, XpStore,
};
