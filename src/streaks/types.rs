//! Streak state and day-granularity transition rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-user streak state, persisted on the XP record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive-day streak including the last active day
    pub current_streak: u32,
    /// Longest streak ever recorded (always >= current_streak)
    pub longest_streak: u32,
    /// Calendar day of the most recent counted activity
    pub last_active_date: Option<NaiveDate>,
    /// Freezes the user may spend to bridge a missed day
    pub freezes_available: u32,
    /// Day most recently bridged by a freeze
    pub freeze_active_date: Option<NaiveDate>,
}

/// Outcome of a single streak transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// First ever activity day
    Started,
    /// Activity on the day after the last active day
    Extended,
    /// Second or later update on the same calendar day
    AlreadyCounted,
    /// Gap of more than one day without a freeze
    Reset,
    /// Gap bridged by consuming a freeze
    Frozen,
}

impl StreakState {
    /// Apply one activity transition for `today`.
    ///
    /// `consume_freeze` requests bridging a multi-day gap with a freeze; it
    /// is only honored when a gap actually exists and a freeze is available,
    /// otherwise the normal rules apply. Repeated calls on the same calendar
    /// day are no-ops, so the transition is idempotent per day.
    pub fn advance(&mut self, today: NaiveDate, consume_freeze: bool) -> StreakOutcome {
        let last = match self.last_active_date {
            None => {
                self.current_streak = 1;
                self.longest_streak = self.longest_streak.max(1);
                self.last_active_date = Some(today);
                return StreakOutcome::Started;
            }
            Some(last) => last,
        };

        let gap_days = (today - last).num_days();

        // Same day, or a last-active date in the future (clock skew): no-op.
        if gap_days <= 0 {
            return StreakOutcome::AlreadyCounted;
        }

        if gap_days == 1 {
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
            self.last_active_date = Some(today);
            return StreakOutcome::Extended;
        }

        if consume_freeze && self.freezes_available > 0 {
            self.freezes_available -= 1;
            self.freeze_active_date = today.pred_opt();
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
            self.last_active_date = Some(today);
            return StreakOutcome::Frozen;
        }

        self.current_streak = 1;
        self.last_active_date = Some(today);
        StreakOutcome::Reset
    }
}
