//! Engine composition root.
//!
//! One `Engine` is constructed per process from explicit store and ledger
//! handles; there is no module-level client or hidden cache. It wires the
//! reconciler, the leaderboard query engine and the streak tracker over one
//! shared `XpStore` and exposes the public operation surface.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::leaderboard::{
    LeaderboardPage, LeaderboardQuery, LeaderboardQueryEngine, QueryError, SortKey, UserStanding,
};
use crate::ledger::LedgerReader;
use crate::reconcile::{ReconcileError, Reconciler, SyncReport, SyncStatus};
use crate::storage::{ActivityEvent, StoreError, XpRecord, XpStore};
use crate::streaks::{StreakError, StreakState, StreakTracker};

/// Process-wide engine context.
pub struct Engine<L> {
    store: Arc<XpStore>,
    reconciler: Reconciler<L>,
    queries: LeaderboardQueryEngine,
    streaks: StreakTracker,
}

impl<L: LedgerReader> Engine<L> {
    /// Wire the engine from a record store and a ledger reader.
    pub fn new(
        store: Arc<XpStore>,
        reader: Arc<L>,
        batch_size: usize,
        batch_delay: Duration,
    ) -> Self {
        let reconciler = Reconciler::new(store.clone(), reader, batch_size, batch_delay);
        let queries = LeaderboardQueryEngine::new(store.clone());
        let streaks = StreakTracker::new(store.clone());

        Self {
            store,
            reconciler,
            queries,
            streaks,
        }
    }

    // ========== Progress inputs ==========

    /// Apply an XP-earning activity event from the progress subsystem.
    pub fn record_activity(&self, event: &ActivityEvent) -> Result<XpRecord, StoreError> {
        self.store.record_activity(event)
    }

    /// Bind a wallet address to a user (identity subsystem input).
    pub fn bind_wallet(&self, user_id: &Uuid, wallet: &str) -> Result<(), StoreError> {
        self.store.bind_wallet(user_id, wallet)
    }

    /// Set the leaderboard opt-out flag (identity subsystem input).
    pub fn set_leaderboard_eligible(
        &self,
        user_id: &Uuid,
        eligible: bool,
    ) -> Result<(), StoreError> {
        self.store.set_leaderboard_eligible(user_id, eligible)
    }

    // ========== Streaks ==========

    /// Record streak activity for today.
    pub fn update_streak(&self, user_id: &Uuid) -> Result<StreakState, StreakError> {
        self.streaks.update(user_id)
    }

    /// Record streak activity for an explicit calendar day.
    pub fn update_streak_on(
        &self,
        user_id: &Uuid,
        date: chrono::NaiveDate,
    ) -> Result<StreakState, StreakError> {
        self.streaks.update_on(user_id, date, false)
    }

    /// Record streak activity for today, spending a freeze to bridge a
    /// missed day. Consumption is always this explicit external trigger.
    pub fn use_streak_freeze(&self, user_id: &Uuid) -> Result<StreakState, StreakError> {
        self.streaks.update_consuming_freeze(user_id)
    }

    /// Grant extra streak freezes.
    pub fn grant_streak_freezes(&self, user_id: &Uuid, count: u32) -> Result<(), StreakError> {
        self.streaks.grant_freezes(user_id, count)
    }

    // ========== Reconciliation ==========

    /// Run a batch reconciliation pass over every bound wallet.
    pub async fn run_sync(&self) -> Result<SyncReport, ReconcileError> {
        self.reconciler.run_sync().await
    }

    /// Reconcile one wallet on demand and return the fresh record.
    pub async fn fetch_user_data(&self, wallet: &str) -> Result<XpRecord, ReconcileError> {
        self.reconciler.fetch_user_data(wallet).await
    }

    /// Observable state of the batch reconciliation run.
    pub fn sync_status(&self) -> SyncStatus {
        self.reconciler.status()
    }

    // ========== Leaderboard ==========

    /// Serve one page of the leaderboard.
    pub fn get_leaderboard(&self, query: &LeaderboardQuery) -> Result<LeaderboardPage, QueryError> {
        self.queries.get_leaderboard(query)
    }

    /// A user's shared-tie rank on one metric.
    pub fn get_user_rank(&self, user_id: &Uuid, sort_by: SortKey) -> Result<u64, QueryError> {
        self.queries.get_user_rank(user_id, sort_by)
    }

    /// Rank plus eligible-user total and percentile.
    pub fn get_user_standing(
        &self,
        user_id: &Uuid,
        sort_by: SortKey,
    ) -> Result<UserStanding, QueryError> {
        self.queries.get_user_standing(user_id, sort_by)
    }
}
