//! Leaderboard query engine.
//!
//! Serves filtered, sorted, paginated views over reconciled XP records, and
//! single-user rank lookups. Reads are not snapshot-isolated against
//! concurrent reconciliation writes; a page may mix reconciliation passes,
//! bounded by its `last_updated` stamp.

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use uuid::Uuid;

use super::types::{
    LeaderboardEntry, LeaderboardPage, LeaderboardQuery, SortKey, Timeframe, UserStanding,
};
use crate::storage::{StoreError, XpRecord, XpStore};

/// Query engine over the reconciled record store.
pub struct LeaderboardQueryEngine {
    store: Arc<XpStore>,
}

impl LeaderboardQueryEngine {
    /// Create a new query engine over the shared record store.
    pub fn new(store: Arc<XpStore>) -> Self {
        Self { store }
    }

    /// Serve one page of the leaderboard.
    ///
    /// `total` counts the filtered candidate set before pagination, so it is
    /// identical across pages of the same query. Ranks reflect the global
    /// sorted position: `offset + position_in_page + 1`.
    pub fn get_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<LeaderboardPage, QueryError> {
        query.validate().map_err(QueryError::InvalidQuery)?;

        let now = Utc::now();
        let cutoff = timeframe_cutoff(query.timeframe, now);

        let total = self.store.count_eligible(cutoff)?;
        let records =
            self.store
                .leaderboard_page(query.sort_by, cutoff, query.limit, query.offset)?;

        let entries = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| to_entry(record, query.offset + position as u32 + 1))
            .collect();

        Ok(LeaderboardPage {
            entries,
            total,
            timeframe: query.timeframe,
            last_updated: now,
        })
    }

    /// A user's rank on one metric: 1 + the number of eligible users whose
    /// metric is strictly greater. Tied users share a rank. The subject's
    /// own eligibility is deliberately not checked.
    pub fn get_user_rank(&self, user_id: &Uuid, sort_by: SortKey) -> Result<u64, QueryError> {
        let record = self
            .store
            .get_record(user_id)?
            .ok_or(QueryError::UnknownUser(*user_id))?;

        let value = metric_value(&record, sort_by);
        Ok(1 + self.store.count_strictly_greater(sort_by, value)?)
    }

    /// Rank plus eligible-user total and percentile.
    pub fn get_user_standing(
        &self,
        user_id: &Uuid,
        sort_by: SortKey,
    ) -> Result<UserStanding, QueryError> {
        let record = self
            .store
            .get_record(user_id)?
            .ok_or(QueryError::UnknownUser(*user_id))?;

        let metric_value = metric_value(&record, sort_by);
        let rank = 1 + self.store.count_strictly_greater(sort_by, metric_value)?;
        let total_users = self.store.count_eligible(None)?;
        let percentile = if total_users > 0 {
            100.0 * (1.0 - (rank as f64 / total_users as f64))
        } else {
            0.0
        };

        Ok(UserStanding {
            rank,
            total_users,
            metric_value,
            percentile,
        })
    }
}

/// Lower bound on `last_activity_at` for a timeframe, if any.
fn timeframe_cutoff(timeframe: Timeframe, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match timeframe {
        Timeframe::AllTime => None,
        Timeframe::Daily => {
            let midnight = now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time");
            Some(Utc.from_utc_datetime(&midnight))
        }
        Timeframe::Weekly => Some(now - Duration::days(7)),
        Timeframe::Monthly => now
            .checked_sub_months(Months::new(1))
            .or(Some(now - Duration::days(30))),
    }
}

fn metric_value(record: &XpRecord, sort_by: SortKey) -> u64 {
    match sort_by {
        SortKey::Xp => record.total_xp,
        SortKey::Streak => record.current_streak as u64,
        SortKey::Courses => record.courses_completed as u64,
        SortKey::Challenges => record.challenges_completed as u64,
    }
}

fn to_entry(record: XpRecord, rank: u32) -> LeaderboardEntry {
    LeaderboardEntry {
        rank,
        level: record.level(),
        title: record.title(),
        user_id: record.user_id,
        wallet_address: record.wallet_address,
        total_xp: record.total_xp,
        current_streak: record.current_streak,
        longest_streak: record.longest_streak,
        courses_completed: record.courses_completed,
        lessons_completed: record.lessons_completed,
        challenges_completed: record.challenges_completed,
        last_activity_at: record.last_activity_at,
    }
}

/// Leaderboard query errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No record for user {0}")]
    UnknownUser(Uuid),
}
