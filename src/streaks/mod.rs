//! Streaks module
//!
//! Provides day-granularity activity streak state and tracking, with an
//! optional freeze mechanic for bridging a missed day.

pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use tracker::{StreakError, StreakTracker};
pub use types::{StreakOutcome, StreakState};
