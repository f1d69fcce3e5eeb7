//! Store-backed streak tracking.
//!
//! Every transition is persisted synchronously; transitions are idempotent
//! per calendar day, so last-write-wins under light concurrency is safe.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::types::{StreakOutcome, StreakState};
use crate::storage::{StoreError, XpStore};

/// Day-based activity streak tracker.
pub struct StreakTracker {
    store: Arc<XpStore>,
}

impl StreakTracker {
    /// Create a new tracker over the shared record store.
    pub fn new(store: Arc<XpStore>) -> Self {
        Self { store }
    }

    /// Record activity for today (UTC).
    pub fn update(&self, user_id: &Uuid) -> Result<StreakState, StreakError> {
        self.update_on(user_id, Utc::now().date_naive(), false)
    }

    /// Record activity for today, consuming a freeze to bridge a missed day.
    ///
    /// Freeze consumption is an external decision; this is the only path
    /// that spends one, and only when a multi-day gap actually exists.
    pub fn update_consuming_freeze(&self, user_id: &Uuid) -> Result<StreakState, StreakError> {
        self.update_on(user_id, Utc::now().date_naive(), true)
    }

    /// Record activity for an explicit calendar day.
    pub fn update_on(
        &self,
        user_id: &Uuid,
        today: NaiveDate,
        consume_freeze: bool,
    ) -> Result<StreakState, StreakError> {
        let mut state = self.store.load_streak(user_id)?;
        let outcome = state.advance(today, consume_freeze);

        if outcome != StreakOutcome::AlreadyCounted {
            self.store.save_streak(user_id, &state, Utc::now())?;
        }

        tracing::debug!(
            user_id = %user_id,
            ?outcome,
            current = state.current_streak,
            longest = state.longest_streak,
            "streak transition"
        );

        Ok(state)
    }

    /// Grant extra freezes to a user.
    pub fn grant_freezes(&self, user_id: &Uuid, count: u32) -> Result<(), StreakError> {
        self.store.get_or_create(user_id)?;
        self.store.grant_freezes(user_id, count)?;
        Ok(())
    }
}

/// Streak tracking errors.
#[derive(Debug, thiserror::Error)]
pub enum StreakError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
