//! Rate-limited batch balance fetching.
//!
//! Reads within one batch run concurrently; batches run sequentially with a
//! fixed delay between them, which is the backpressure mechanism against the
//! ledger's rate limits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::types::LedgerReader;

/// Default number of concurrent reads per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default delay between consecutive batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Batched, rate-limited ledger reader.
pub struct BatchFetcher<L> {
    reader: Arc<L>,
    batch_size: usize,
    batch_delay: Duration,
}

impl<L: LedgerReader> BatchFetcher<L> {
    /// Create a fetcher with default batch limits.
    pub fn new(reader: Arc<L>) -> Self {
        Self::with_limits(reader, DEFAULT_BATCH_SIZE, DEFAULT_BATCH_DELAY)
    }

    /// Create a fetcher with explicit batch limits.
    pub fn with_limits(reader: Arc<L>, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            reader,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Fetch balances for every address.
    ///
    /// The result covers each input address exactly once; a failed read
    /// yields `None` for that address and never aborts the batch or any
    /// later batch.
    pub async fn fetch_balances(&self, addresses: &[String]) -> HashMap<String, Option<u64>> {
        let mut balances = HashMap::with_capacity(addresses.len());

        for (index, batch) in addresses.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            let reads = batch.iter().map(|address| self.read_one(address));
            for (address, balance) in batch.iter().zip(join_all(reads).await) {
                balances.insert(address.clone(), balance);
            }
        }

        balances
    }

    async fn read_one(&self, address: &str) -> Option<u64> {
        match self.reader.balance(address).await {
            Ok(lookup) => Some(lookup.xp_value()),
            Err(e) => {
                tracing::warn!(wallet = %address, error = %e, "Ledger read failed");
                None
            }
        }
    }
}
