//! XP record storage operations.
//!
//! `XpStore` is the single repository through which every component — the
//! reconciler, the streak tracker and the leaderboard query engine — reaches
//! persisted state. Each public method locks the connection once, so a
//! read-modify-write sequence is atomic with respect to other callers.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::leaderboard::types::SortKey;
use crate::levels;
use crate::storage::database::Database;
use crate::streaks::types::StreakState;

/// Kind of completed activity, used to bump the matching counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Course,
    Lesson,
    Challenge,
}

/// An XP-earning event emitted by the progress subsystem.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub user_id: Uuid,
    pub xp_delta: u64,
    pub kind: Option<ActivityKind>,
    pub timestamp: DateTime<Utc>,
}

/// One user's persisted XP record.
///
/// `total_xp` is always `max(on_chain_xp, off_chain_xp)` and never decreases;
/// the level is derived from it on demand, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct XpRecord {
    pub user_id: Uuid,
    pub wallet_address: Option<String>,
    pub on_chain_xp: u64,
    pub off_chain_xp: u64,
    pub total_xp: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub streak_freezes: u32,
    pub freeze_active_date: Option<NaiveDate>,
    pub courses_completed: u32,
    pub lessons_completed: u32,
    pub challenges_completed: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub leaderboard_eligible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl XpRecord {
    fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            wallet_address: None,
            on_chain_xp: 0,
            off_chain_xp: 0,
            total_xp: 0,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            streak_freezes: 0,
            freeze_active_date: None,
            courses_completed: 0,
            lessons_completed: 0,
            challenges_completed: 0,
            last_activity_at: None,
            last_synced_at: None,
            leaderboard_eligible: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Level derived from total XP.
    pub fn level(&self) -> u32 {
        levels::level_for_xp(self.total_xp)
    }

    /// Display title derived from total XP.
    pub fn title(&self) -> &'static str {
        levels::title_for_xp(self.total_xp)
    }

    /// Streak state projection of this record.
    pub fn streak_state(&self) -> StreakState {
        StreakState {
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            last_active_date: self.last_active_date,
            freezes_available: self.streak_freezes,
            freeze_active_date: self.freeze_active_date,
        }
    }
}

/// A user with a bound wallet, input to a reconciliation run.
#[derive(Debug, Clone)]
pub struct WalletBinding {
    pub user_id: Uuid,
    pub wallet_address: String,
}

/// Result of a reconciliation write attempt.
#[derive(Debug, Clone)]
pub enum ReconcileWrite {
    /// `total_xp` changed and the record was persisted
    Updated(XpRecord),
    /// The merge produced no change; nothing was written
    Unchanged(XpRecord),
}

impl ReconcileWrite {
    /// The record after the attempt, whether or not it was written.
    pub fn into_record(self) -> XpRecord {
        match self {
            ReconcileWrite::Updated(record) | ReconcileWrite::Unchanged(record) => record,
        }
    }
}

const RECORD_COLUMNS: &str = "user_id, wallet_address, on_chain_xp, off_chain_xp, total_xp,
     current_streak, longest_streak, last_active_date, streak_freezes, freeze_active_date,
     courses_completed, lessons_completed, challenges_completed,
     last_activity_at, last_synced_at, leaderboard_eligible, created_at, updated_at";

/// Repository over the `xp_records` table.
pub struct XpStore {
    db: Arc<Database>,
}

impl XpStore {
    /// Create a new store over a shared database handle.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a record by user ID.
    pub fn get_record(&self, user_id: &Uuid) -> Result<Option<XpRecord>, StoreError> {
        let conn = self.db.connection();
        Self::fetch_record(&conn, user_id)
    }

    /// Get a record by bound wallet address.
    pub fn find_by_wallet(&self, wallet: &str) -> Result<Option<XpRecord>, StoreError> {
        let conn = self.db.connection();
        Self::fetch_by_wallet(&conn, wallet)
    }

    /// Get a record, creating an empty one if the user has none yet.
    pub fn get_or_create(&self, user_id: &Uuid) -> Result<XpRecord, StoreError> {
        let conn = self.db.connection();
        Self::fetch_or_insert(&conn, user_id)
    }

    /// Apply an activity event: bump off-chain XP, the completion counter for
    /// the event kind, and the activity timestamp. Creates the record on a
    /// user's first event.
    pub fn record_activity(&self, event: &ActivityEvent) -> Result<XpRecord, StoreError> {
        let conn = self.db.connection();
        let mut record = Self::fetch_or_insert(&conn, &event.user_id)?;

        record.off_chain_xp += event.xp_delta;
        record.total_xp = record.total_xp.max(record.off_chain_xp.max(record.on_chain_xp));
        match event.kind {
            Some(ActivityKind::Course) => record.courses_completed += 1,
            Some(ActivityKind::Lesson) => record.lessons_completed += 1,
            Some(ActivityKind::Challenge) => record.challenges_completed += 1,
            None => {}
        }
        // Activity time never moves backwards under out-of-order delivery.
        record.last_activity_at = match record.last_activity_at {
            Some(existing) => Some(existing.max(event.timestamp)),
            None => Some(event.timestamp),
        };
        record.updated_at = Utc::now();

        Self::persist(&conn, &record)?;
        Ok(record)
    }

    /// Bind a wallet address to a user, creating the record if needed.
    ///
    /// Address shape is checked here, at the identity boundary; the
    /// reconciler never sees a malformed address.
    pub fn bind_wallet(&self, user_id: &Uuid, wallet: &str) -> Result<(), StoreError> {
        if !is_plausible_address(wallet) {
            return Err(StoreError::InvalidWallet(wallet.to_string()));
        }

        let conn = self.db.connection();
        let mut record = Self::fetch_or_insert(&conn, user_id)?;
        record.wallet_address = Some(wallet.to_string());
        record.updated_at = Utc::now();
        Self::persist(&conn, &record)
    }

    /// Set the leaderboard opt-out flag.
    pub fn set_leaderboard_eligible(
        &self,
        user_id: &Uuid,
        eligible: bool,
    ) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let updated = conn.execute(
            "UPDATE xp_records SET leaderboard_eligible = ?2, updated_at = ?3 WHERE user_id = ?1",
            params![
                user_id.to_string(),
                eligible as i32,
                Utc::now().to_rfc3339()
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::UnknownUser(*user_id));
        }
        Ok(())
    }

    /// All users with a bound wallet, the input set for a sync run.
    pub fn wallet_bindings(&self) -> Result<Vec<WalletBinding>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT user_id, wallet_address FROM xp_records
             WHERE wallet_address IS NOT NULL ORDER BY user_id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut bindings = Vec::new();
        for row in rows {
            let (user_id, wallet_address) = row?;
            let user_id = Uuid::parse_str(&user_id)
                .map_err(|e| StoreError::CorruptRecord(format!("invalid user id: {}", e)))?;
            bindings.push(WalletBinding {
                user_id,
                wallet_address,
            });
        }

        Ok(bindings)
    }

    /// Merge an observed on-chain balance into a user's record.
    ///
    /// The stored on-chain value only ever rises to the observed balance, so
    /// a balance drop can never regress `total_xp`. The record is written —
    /// and `last_synced_at` updated — only when `total_xp` actually changes.
    pub fn apply_reconciliation(
        &self,
        user_id: &Uuid,
        observed_balance: u64,
        now: DateTime<Utc>,
    ) -> Result<ReconcileWrite, StoreError> {
        let conn = self.db.connection();
        let mut record =
            Self::fetch_record(&conn, user_id)?.ok_or(StoreError::UnknownUser(*user_id))?;

        let merged_on_chain = record.on_chain_xp.max(observed_balance);
        let new_total = record
            .total_xp
            .max(record.off_chain_xp.max(merged_on_chain));

        if new_total == record.total_xp {
            return Ok(ReconcileWrite::Unchanged(record));
        }

        record.on_chain_xp = merged_on_chain;
        record.total_xp = new_total;
        record.last_synced_at = Some(now);
        record.updated_at = now;
        Self::persist(&conn, &record)?;

        Ok(ReconcileWrite::Updated(record))
    }

    /// Load a user's streak state, creating the record if needed.
    pub fn load_streak(&self, user_id: &Uuid) -> Result<StreakState, StoreError> {
        Ok(self.get_or_create(user_id)?.streak_state())
    }

    /// Persist a streak transition.
    pub fn save_streak(
        &self,
        user_id: &Uuid,
        state: &StreakState,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let updated = conn.execute(
            "UPDATE xp_records SET
                 current_streak = ?2, longest_streak = ?3, last_active_date = ?4,
                 streak_freezes = ?5, freeze_active_date = ?6, updated_at = ?7
             WHERE user_id = ?1",
            params![
                user_id.to_string(),
                state.current_streak,
                state.longest_streak,
                state.last_active_date.map(|d| d.to_string()),
                state.freezes_available,
                state.freeze_active_date.map(|d| d.to_string()),
                now.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::UnknownUser(*user_id));
        }
        Ok(())
    }

    /// Grant additional streak freezes (reward systems call this).
    pub fn grant_freezes(&self, user_id: &Uuid, count: u32) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let updated = conn.execute(
            "UPDATE xp_records SET streak_freezes = streak_freezes + ?2, updated_at = ?3
             WHERE user_id = ?1",
            params![user_id.to_string(), count, Utc::now().to_rfc3339()],
        )?;

        if updated == 0 {
            return Err(StoreError::UnknownUser(*user_id));
        }
        Ok(())
    }

    /// Total number of records, bound or not.
    pub fn count_records(&self) -> Result<u64, StoreError> {
        let conn = self.db.connection();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM xp_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ========== Leaderboard queries ==========

    /// Count eligible users active since `cutoff` (all eligible users when
    /// `cutoff` is `None`). This is the pre-pagination candidate-set size.
    pub fn count_eligible(&self, cutoff: Option<DateTime<Utc>>) -> Result<u64, StoreError> {
        let conn = self.db.connection();
        let count: i64 = match cutoff {
            Some(cutoff) => conn.query_row(
                "SELECT COUNT(*) FROM xp_records
                 WHERE leaderboard_eligible = 1
                   AND last_activity_at IS NOT NULL
                   AND datetime(last_activity_at) >= datetime(?1)",
                params![cutoff.to_rfc3339()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM xp_records WHERE leaderboard_eligible = 1",
                [],
                |row| row.get(0),
            )?,
        };

        Ok(count as u64)
    }

    /// One page of the sorted candidate set.
    ///
    /// Ordering is the selected metric descending, then `total_xp`
    /// descending, then `user_id` ascending — fully deterministic, so
    /// repeated calls over unchanged data return identical pages.
    pub fn leaderboard_page(
        &self,
        sort: SortKey,
        cutoff: Option<DateTime<Utc>>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<XpRecord>, StoreError> {
        let conn = self.db.connection();

        let sql = match cutoff {
            Some(_) => format!(
                "SELECT {} FROM xp_records
                 WHERE leaderboard_eligible = 1
                   AND last_activity_at IS NOT NULL
                   AND datetime(last_activity_at) >= datetime(?1)
                 ORDER BY {} DESC, total_xp DESC, user_id ASC
                 LIMIT ?2 OFFSET ?3",
                RECORD_COLUMNS,
                sort.column()
            ),
            None => format!(
                "SELECT {} FROM xp_records
                 WHERE leaderboard_eligible = 1
                 ORDER BY {} DESC, total_xp DESC, user_id ASC
                 LIMIT ?1 OFFSET ?2",
                RECORD_COLUMNS,
                sort.column()
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<XpRecordRow> = match cutoff {
            Some(cutoff) => stmt
                .query_map(
                    params![cutoff.to_rfc3339(), limit, offset],
                    XpRecordRow::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![limit, offset], XpRecordRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        rows.into_iter().map(|row| row.into_record()).collect()
    }

    /// Count eligible users whose metric strictly exceeds `value`.
    pub fn count_strictly_greater(&self, sort: SortKey, value: u64) -> Result<u64, StoreError> {
        let conn = self.db.connection();
        let sql = format!(
            "SELECT COUNT(*) FROM xp_records WHERE leaderboard_eligible = 1 AND {} > ?1",
            sort.column()
        );

        let count: i64 = conn.query_row(&sql, params![value as i64], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ========== Internal helpers (caller holds the connection lock) ==========

    fn fetch_record(conn: &Connection, user_id: &Uuid) -> Result<Option<XpRecord>, StoreError> {
        let sql = format!("SELECT {} FROM xp_records WHERE user_id = ?1", RECORD_COLUMNS);
        let row = conn
            .query_row(&sql, params![user_id.to_string()], XpRecordRow::from_row)
            .optional()?;

        row.map(|row| row.into_record()).transpose()
    }

    fn fetch_by_wallet(conn: &Connection, wallet: &str) -> Result<Option<XpRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM xp_records WHERE wallet_address = ?1",
            RECORD_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![wallet], XpRecordRow::from_row)
            .optional()?;

        row.map(|row| row.into_record()).transpose()
    }

    fn fetch_or_insert(conn: &Connection, user_id: &Uuid) -> Result<XpRecord, StoreError> {
        if let Some(record) = Self::fetch_record(conn, user_id)? {
            return Ok(record);
        }

        let record = XpRecord::new(*user_id, Utc::now());
        conn.execute(
            "INSERT INTO xp_records (user_id, leaderboard_eligible, created_at, updated_at)
             VALUES (?1, 1, ?2, ?3)",
            params![
                record.user_id.to_string(),
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(record)
    }

    fn persist(conn: &Connection, record: &XpRecord) -> Result<(), StoreError> {
        let updated = conn.execute(
            "UPDATE xp_records SET
                 wallet_address = ?2, on_chain_xp = ?3, off_chain_xp = ?4, total_xp = ?5,
                 current_streak = ?6, longest_streak = ?7, last_active_date = ?8,
                 streak_freezes = ?9, freeze_active_date = ?10,
                 courses_completed = ?11, lessons_completed = ?12, challenges_completed = ?13,
                 last_activity_at = ?14, last_synced_at = ?15, leaderboard_eligible = ?16,
                 updated_at = ?17
             WHERE user_id = ?1",
            params![
                record.user_id.to_string(),
                record.wallet_address,
                record.on_chain_xp as i64,
                record.off_chain_xp as i64,
                record.total_xp as i64,
                record.current_streak,
                record.longest_streak,
                record.last_active_date.map(|d| d.to_string()),
                record.streak_freezes,
                record.freeze_active_date.map(|d| d.to_string()),
                record.courses_completed,
                record.lessons_completed,
                record.challenges_completed,
                record.last_activity_at.map(|t| t.to_rfc3339()),
                record.last_synced_at.map(|t| t.to_rfc3339()),
                record.leaderboard_eligible as i32,
                record.updated_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::UnknownUser(record.user_id));
        }
        Ok(())
    }
}

/// Cheap shape check for wallet addresses; real verification is the identity
/// subsystem's job.
fn is_plausible_address(wallet: &str) -> bool {
    (32..=64).contains(&wallet.len()) && wallet.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Intermediate struct for reading record rows from the database.
struct XpRecordRow {
    user_id: String,
    wallet_address: Option<String>,
    on_chain_xp: i64,
    off_chain_xp: i64,
    total_xp: i64,
    current_streak: u32,
    longest_streak: u32,
    last_active_date: Option<String>,
    streak_freezes: u32,
    freeze_active_date: Option<String>,
    courses_completed: u32,
    lessons_completed: u32,
    challenges_completed: u32,
    last_activity_at: Option<String>,
    last_synced_at: Option<String>,
    leaderboard_eligible: i32,
    created_at: String,
    updated_at: String,
}

impl XpRecordRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            wallet_address: row.get(1)?,
            on_chain_xp: row.get(2)?,
            off_chain_xp: row.get(3)?,
            total_xp: row.get(4)?,
            current_streak: row.get(5)?,
            longest_streak: row.get(6)?,
            last_active_date: row.get(7)?,
            streak_freezes: row.get(8)?,
            freeze_active_date: row.get(9)?,
            courses_completed: row.get(10)?,
            lessons_completed: row.get(11)?,
            challenges_completed: row.get(12)?,
            last_activity_at: row.get(13)?,
            last_synced_at: row.get(14)?,
            leaderboard_eligible: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    fn into_record(self) -> Result<XpRecord, StoreError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| StoreError::CorruptRecord(format!("invalid user id: {}", e)))?;

        let parse_date = |s: Option<String>, field: &str| -> Result<Option<NaiveDate>, StoreError> {
            s.map(|s| {
                s.parse::<NaiveDate>().map_err(|e| {
                    StoreError::CorruptRecord(format!("invalid {}: {}", field, e))
                })
            })
            .transpose()
        };

        let parse_time =
            |s: Option<String>, field: &str| -> Result<Option<DateTime<Utc>>, StoreError> {
                s.map(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| {
                            StoreError::CorruptRecord(format!("invalid {}: {}", field, e))
                        })
                })
                .transpose()
            };

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StoreError::CorruptRecord(format!("invalid created_at: {}", e)))?;
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StoreError::CorruptRecord(format!("invalid updated_at: {}", e)))?;

        Ok(XpRecord {
            user_id,
            wallet_address: self.wallet_address,
            on_chain_xp: self.on_chain_xp as u64,
            off_chain_xp: self.off_chain_xp as u64,
            total_xp: self.total_xp as u64,
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            last_active_date: parse_date(self.last_active_date, "last_active_date")?,
            streak_freezes: self.streak_freezes,
            freeze_active_date: parse_date(self.freeze_active_date, "freeze_active_date")?,
            courses_completed: self.courses_completed,
            lessons_completed: self.lessons_completed,
            challenges_completed: self.challenges_completed,
            last_activity_at: parse_time(self.last_activity_at, "last_activity_at")?,
            last_synced_at: parse_time(self.last_synced_at, "last_synced_at")?,
            leaderboard_eligible: self.leaderboard_eligible != 0,
            created_at,
            updated_at,
        })
    }
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    #[error("No record for user {0}")]
    UnknownUser(Uuid),
}
