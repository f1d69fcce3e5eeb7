//! HTTP ledger client.
//!
//! Reads asset balances from a ledger RPC gateway. Every request carries a
//! bounded timeout so one stalled read cannot stall an entire batch.

use std::time::Duration;

use serde::Deserialize;

use super::types::{BalanceLookup, LedgerError, LedgerReader};

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Ledger RPC client over HTTP.
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: String,
    asset_id: String,
}

impl HttpLedgerClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: String, asset_id: String) -> Self {
        Self::with_timeout(base_url, asset_id, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: String, asset_id: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url,
            asset_id,
        }
    }

    /// The asset this client reads balances for.
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    async fn read_balance(&self, address: &str) -> Result<BalanceLookup, LedgerError> {
        let url = format!(
            "{}/v1/assets/{}/balances/{}",
            self.base_url, self.asset_id, address
        );

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                LedgerError::Timeout
            } else {
                LedgerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();

        if status.as_u16() == 404 {
            return Ok(BalanceLookup::NotFound);
        }

        if !status.is_success() {
            return Err(LedgerError::Api(format!(
                "ledger returned status {}",
                status
            )));
        }

        let api_response: ApiResponse<BalancePayload> = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        if !api_response.success {
            let error = api_response.error.unwrap_or_default();
            return Err(LedgerError::Api(error.message));
        }

        let payload = api_response
            .data
            .ok_or_else(|| LedgerError::InvalidResponse("success without data".to_string()))?;

        Ok(BalanceLookup::Found {
            amount: payload.amount,
            decimals: payload.decimals,
        })
    }
}

impl LedgerReader for HttpLedgerClient {
    async fn balance(&self, address: &str) -> Result<BalanceLookup, LedgerError> {
        self.read_balance(address).await
    }
}

/// API response wrapper.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<ApiError>,
}

/// API error details.
#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct ApiError {
    code: String,
    message: String,
}

/// Balance payload for one account.
#[derive(Debug, Deserialize)]
struct BalancePayload {
    amount: u64,
    decimals: u8,
}
