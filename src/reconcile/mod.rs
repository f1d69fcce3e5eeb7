//! Reconciliation module
//!
//! Merges ledger balances and off-chain XP under a monotonic-max policy.

pub mod reconciler;

// Re-export commonly used types
pub use reconciler::{ReconcileError, Reconciler, SyncReport, SyncStatus};
