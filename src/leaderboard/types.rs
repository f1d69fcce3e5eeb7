//! Leaderboard query and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest page size a single query may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Activity window a leaderboard query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    /// No activity filter
    #[default]
    AllTime,
    /// Active within the last calendar month
    Monthly,
    /// Active within the last 7 days
    Weekly,
    /// Active since the start of the current UTC day
    Daily,
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::AllTime => write!(f, "all-time"),
            Timeframe::Monthly => write!(f, "monthly"),
            Timeframe::Weekly => write!(f, "weekly"),
            Timeframe::Daily => write!(f, "daily"),
        }
    }
}

/// Metric the leaderboard is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Total XP (the reconciled value)
    #[default]
    Xp,
    /// Current activity streak
    Streak,
    /// Courses completed
    Courses,
    /// Challenges completed
    Challenges,
}

impl SortKey {
    /// Column backing this metric in the record store.
    pub(crate) fn column(self) -> &'static str {
        match self {
            SortKey::Xp => "total_xp",
            SortKey::Streak => "current_streak",
            SortKey::Courses => "courses_completed",
            SortKey::Challenges => "challenges_completed",
        }
    }
}

/// A validated leaderboard query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub timeframe: Timeframe,
    pub sort_by: SortKey,
    pub limit: u32,
    pub offset: u32,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::AllTime,
            sort_by: SortKey::Xp,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl LeaderboardQuery {
    /// Validate the query before it reaches the store.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be at least 1".to_string());
        }
        if self.limit > MAX_PAGE_SIZE {
            return Err(format!("limit must be at most {}", MAX_PAGE_SIZE));
        }
        Ok(())
    }
}

/// One ranked leaderboard entry.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    /// Global position in the sorted candidate set (1-based)
    pub rank: u32,
    pub user_id: Uuid,
    pub wallet_address: Option<String>,
    pub total_xp: u64,
    /// Level derived from total_xp
    pub level: u32,
    /// Display title for the level
    pub title: &'static str,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub courses_completed: u32,
    pub lessons_completed: u32,
    pub challenges_completed: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// One page of leaderboard results.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    /// Size of the filtered candidate set before pagination
    pub total: u64,
    pub timeframe: Timeframe,
    /// Snapshot timestamp for this query
    pub last_updated: DateTime<Utc>,
}

/// A user's standing on one metric.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UserStanding {
    /// 1 + number of eligible users strictly ahead; tied users share a rank
    pub rank: u64,
    /// Number of eligible users
    pub total_users: u64,
    /// Metric value the rank was computed from
    pub metric_value: u64,
    /// Share of eligible users this user is ahead of
    pub percentile: f64,
}
