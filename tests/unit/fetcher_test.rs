//! Unit tests for rate-limited batch fetching

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use questboard::ledger::{BalanceLookup, BatchFetcher, LedgerError, LedgerReader};

/// Scripted ledger: per-address balances, a set of failing addresses, and a
/// call counter.
struct ScriptedLedger {
    balances: HashMap<String, u64>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedLedger {
    fn new(balances: HashMap<String, u64>, failing: HashSet<String>) -> Self {
        Self {
            balances,
            failing,
            calls: AtomicUsize::new(0),
        }
    }
}

impl LedgerReader for ScriptedLedger {
    async fn balance(&self, address: &str) -> Result<BalanceLookup, LedgerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(address) {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        match self.balances.get(address) {
            Some(&amount) => Ok(BalanceLookup::Found { amount, decimals: 0 }),
            None => Ok(BalanceLookup::NotFound),
        }
    }
}

fn wallets(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("wallet{:040}", i)).collect()
}

#[tokio::test]
async fn test_failure_isolated_to_one_wallet() {
    let addrs = wallets(12);
    let balances: HashMap<String, u64> = addrs
        .iter()
        .enumerate()
        .map(|(i, a)| (a.clone(), (i as u64) * 10))
        .collect();
    let failing = HashSet::from([addrs[7].clone()]);

    let ledger = Arc::new(ScriptedLedger::new(balances, failing));
    let fetcher = BatchFetcher::with_limits(ledger.clone(), 10, Duration::from_millis(1));

    let result = fetcher.fetch_balances(&addrs).await;

    assert_eq!(result.len(), 12);
    for (i, addr) in addrs.iter().enumerate() {
        match i {
            7 => assert_eq!(result[addr], None),
            _ => assert_eq!(result[addr], Some((i as u64) * 10)),
        }
    }
    // Every wallet was attempted despite the failure.
    assert_eq!(ledger.calls.load(Ordering::Relaxed), 12);
}

#[tokio::test(start_paused = true)]
async fn test_25_wallets_pay_exactly_two_delays() {
    let addrs = wallets(25);
    let balances = addrs.iter().map(|a| (a.clone(), 1u64)).collect();

    let ledger = Arc::new(ScriptedLedger::new(balances, HashSet::new()));
    let fetcher = BatchFetcher::with_limits(ledger, 10, Duration::from_millis(100));

    let started = tokio::time::Instant::now();
    let result = fetcher.fetch_balances(&addrs).await;

    assert_eq!(result.len(), 25);
    assert_eq!(started.elapsed(), Duration::from_millis(200));
}

#[tokio::test]
async fn test_every_input_covered_once() {
    let addrs = wallets(7);
    let balances = addrs.iter().map(|a| (a.clone(), 5u64)).collect();

    let ledger = Arc::new(ScriptedLedger::new(balances, HashSet::new()));
    let fetcher = BatchFetcher::with_limits(ledger, 3, Duration::from_millis(1));

    let result = fetcher.fetch_balances(&addrs).await;

    assert_eq!(result.len(), addrs.len());
    for addr in &addrs {
        assert!(result.contains_key(addr));
    }
}

#[tokio::test]
async fn test_all_failures_still_cover_inputs() {
    let addrs = wallets(5);
    let failing: HashSet<String> = addrs.iter().cloned().collect();

    let ledger = Arc::new(ScriptedLedger::new(HashMap::new(), failing));
    let fetcher = BatchFetcher::with_limits(ledger, 2, Duration::from_millis(1));

    let result = fetcher.fetch_balances(&addrs).await;

    assert_eq!(result.len(), 5);
    assert!(result.values().all(|balance| balance.is_none()));
}
