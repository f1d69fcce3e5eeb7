//! Ledger module
//!
//! Provides typed balance reads against the external ledger, the HTTP
//! client, and rate-limited batch fetching.

pub mod client;
pub mod fetcher;
pub mod types;

// Re-export commonly used types
pub use client::HttpLedgerClient;
pub use fetcher::{BatchFetcher, DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE};
pub use types::{BalanceLookup, LedgerError, LedgerReader};
