//! Questboard - XP reconciliation and leaderboard daemon.
//!
//! Main entry point: loads configuration, opens the record store, and runs
//! periodic reconciliation passes against the ledger.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use questboard::config;
use questboard::engine::Engine;
use questboard::ledger::HttpLedgerClient;
use questboard::storage::{Database, XpStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Questboard v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config().context("Failed to load configuration")?;

    let db = Database::open(&config.database_path()).context("Failed to open database")?;
    let store = Arc::new(XpStore::new(Arc::new(db)));

    let client = Arc::new(HttpLedgerClient::with_timeout(
        config.ledger.rpc_url.clone(),
        config.ledger.asset_id.clone(),
        config.ledger.request_timeout(),
    ));

    let engine = Engine::new(
        store,
        client,
        config.sync.batch_size,
        config.sync.batch_delay(),
    );

    tracing::info!(
        interval_secs = config.sync.interval_secs,
        rpc_url = %config.ledger.rpc_url,
        "Entering reconciliation loop"
    );

    let mut ticker = tokio::time::interval(config.sync.interval());
    loop {
        ticker.tick().await;

        match engine.run_sync().await {
            Ok(report) => tracing::info!(
                synced = report.synced,
                skipped = report.skipped,
                errors = report.errors,
                "Sync pass finished"
            ),
            Err(e) => tracing::error!(error = %e, "Sync pass failed"),
        }
    }
}
