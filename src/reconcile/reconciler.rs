//! XP reconciliation between off-chain records and the ledger.
//!
//! Batch mode pulls every bound wallet's balance through the rate-limited
//! fetcher and merges under the monotonic-max policy; on-demand mode mirrors
//! the same merge synchronously for a single wallet.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::ledger::{BatchFetcher, LedgerReader};
use crate::storage::{ReconcileWrite, StoreError, XpRecord, XpStore};

/// Statistics from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records whose total changed and were persisted
    pub synced: usize,
    /// Users with no bound wallet, unavailable balance, or unchanged value
    pub skipped: usize,
    /// Records whose persistence failed
    pub errors: usize,
}

/// Observable state of the batch reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Running,
    Completed(SyncReport),
}

/// Merges ledger balances into persisted XP records.
pub struct Reconciler<L> {
    store: Arc<XpStore>,
    reader: Arc<L>,
    fetcher: BatchFetcher<L>,
    status: Mutex<SyncStatus>,
}

impl<L: LedgerReader> Reconciler<L> {
    /// Create a reconciler over shared store and ledger handles.
    pub fn new(
        store: Arc<XpStore>,
        reader: Arc<L>,
        batch_size: usize,
        batch_delay: Duration,
    ) -> Self {
        let fetcher = BatchFetcher::with_limits(reader.clone(), batch_size, batch_delay);
        Self {
            store,
            reader,
            fetcher,
            status: Mutex::new(SyncStatus::Idle),
        }
    }

    /// Current run status.
    pub fn status(&self) -> SyncStatus {
        *self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_status(&self, status: SyncStatus) {
        *self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }

    /// Reconcile every user with a bound wallet.
    ///
    /// Per-user failures are isolated: a failed balance read counts the user
    /// as skipped, a failed write counts under errors, and neither aborts
    /// the remaining users. Overlapping runs are not guarded against;
    /// callers are expected to schedule one periodic run at a time.
    pub async fn run_sync(&self) -> Result<SyncReport, ReconcileError> {
        self.set_status(SyncStatus::Running);

        let bindings = match self.store.wallet_bindings() {
            Ok(bindings) => bindings,
            Err(e) => {
                self.set_status(SyncStatus::Idle);
                return Err(e.into());
            }
        };
        let unbound = match self.store.count_records() {
            Ok(total) => (total as usize).saturating_sub(bindings.len()),
            Err(e) => {
                self.set_status(SyncStatus::Idle);
                return Err(e.into());
            }
        };

        let addresses: Vec<String> = bindings
            .iter()
            .map(|b| b.wallet_address.clone())
            .collect();
        let balances = self.fetcher.fetch_balances(&addresses).await;

        let mut report = SyncReport {
            skipped: unbound,
            ..Default::default()
        };
        let now = Utc::now();

        for binding in &bindings {
            let balance = balances.get(&binding.wallet_address).copied().flatten();

            let Some(balance) = balance else {
                report.skipped += 1;
                continue;
            };

            match self
                .store
                .apply_reconciliation(&binding.user_id, balance, now)
            {
                Ok(ReconcileWrite::Updated(_)) => report.synced += 1,
                Ok(ReconcileWrite::Unchanged(_)) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(
                        user_id = %binding.user_id,
                        wallet = %binding.wallet_address,
                        error = %e,
                        "Failed to persist reconciled XP"
                    );
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            synced = report.synced,
            skipped = report.skipped,
            errors = report.errors,
            "Reconciliation run complete"
        );
        self.set_status(SyncStatus::Completed(report));

        Ok(report)
    }

    /// Reconcile a single wallet on demand and return the fresh record.
    ///
    /// A failed ledger read is treated as a zero balance and never surfaced;
    /// store failures are hard errors.
    pub async fn fetch_user_data(&self, wallet: &str) -> Result<XpRecord, ReconcileError> {
        let record = self
            .store
            .find_by_wallet(wallet)?
            .ok_or_else(|| ReconcileError::UnknownWallet(wallet.to_string()))?;

        let balance = match self.reader.balance(wallet).await {
            Ok(lookup) => lookup.xp_value(),
            Err(e) => {
                tracing::warn!(
                    user_id = %record.user_id,
                    wallet = %wallet,
                    error = %e,
                    "Ledger read failed, treating balance as zero"
                );
                0
            }
        };

        let write = self
            .store
            .apply_reconciliation(&record.user_id, balance, Utc::now())?;
        Ok(write.into_record())
    }
}

/// Reconciliation errors.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No record bound to wallet {0}")]
    UnknownWallet(String),
}
