//! Questboard - XP Reconciliation & Leaderboard Engine
//!
//! An open-source, self-hosted engine for learn-to-earn platforms. Merges a
//! rate-limited external ledger balance with a locally-mutable progress
//! record under a monotonic-max policy, maintains day-based activity
//! streaks, and serves deterministic paginated leaderboard queries.

pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod ledger;
pub mod levels;
pub mod reconcile;
pub mod storage;
pub mod streaks;

// Re-export commonly used types
pub use engine::Engine;
pub use leaderboard::{LeaderboardQuery, LeaderboardQueryEngine};
pub use ledger::{BatchFetcher, HttpLedgerClient};
pub use reconcile::Reconciler;
pub use storage::{XpRecord, XpStore};
pub use streaks::StreakTracker;
