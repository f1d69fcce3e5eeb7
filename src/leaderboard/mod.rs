//! Leaderboard module
//!
//! Provides validated leaderboard queries, deterministic ranked pages, and
//! single-user rank lookups.

pub mod query;
pub mod types;

// Re-export commonly used types
pub use query::{LeaderboardQueryEngine, QueryError};
pub use types::{
    LeaderboardEntry, LeaderboardPage, LeaderboardQuery, SortKey, Timeframe, UserStanding,
};
