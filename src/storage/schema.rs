//! Database schema definitions for Questboard.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- XP records table: one row per user, off-chain and on-chain XP plus
-- streak state and completion counters.
CREATE TABLE IF NOT EXISTS xp_records (
    user_id TEXT PRIMARY KEY,
    wallet_address TEXT,
    on_chain_xp INTEGER NOT NULL DEFAULT 0,
    off_chain_xp INTEGER NOT NULL DEFAULT 0,
    total_xp INTEGER NOT NULL DEFAULT 0,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_active_date TEXT,
    streak_freezes INTEGER NOT NULL DEFAULT 0,
    freeze_active_date TEXT,
    courses_completed INTEGER NOT NULL DEFAULT 0,
    lessons_completed INTEGER NOT NULL DEFAULT 0,
    challenges_completed INTEGER NOT NULL DEFAULT 0,
    last_activity_at TEXT,
    last_synced_at TEXT,
    leaderboard_eligible INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_xp_records_wallet
    ON xp_records(wallet_address) WHERE wallet_address IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_xp_records_total_xp ON xp_records(total_xp);
CREATE INDEX IF NOT EXISTS idx_xp_records_last_activity ON xp_records(last_activity_at);
"#;

/// SQL for the schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
