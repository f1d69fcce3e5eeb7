//! Ledger read types and the reader seam.

use std::future::Future;

use thiserror::Error;

/// Result of a ledger balance read.
///
/// "Account not found" is a first-class outcome, never inferred from error
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceLookup {
    /// The account exists and holds `amount` base units
    Found { amount: u64, decimals: u8 },
    /// No account exists for the address
    NotFound,
}

impl BalanceLookup {
    /// Balance in whole XP units (base units scaled down by `10^decimals`).
    /// A missing account holds zero.
    pub fn xp_value(&self) -> u64 {
        match *self {
            BalanceLookup::Found { amount, decimals } => amount / 10u64.pow(decimals as u32),
            BalanceLookup::NotFound => 0,
        }
    }
}

/// Ledger read errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Ledger API error: {0}")]
    Api(String),

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

/// Read-only view of ledger balances for a fixed asset.
///
/// The seam between the reconciliation core and whatever network client
/// backs it; tests substitute an in-memory reader.
pub trait LedgerReader: Send + Sync {
    /// Read the balance held by `address`.
    fn balance(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<BalanceLookup, LedgerError>> + Send;
}
