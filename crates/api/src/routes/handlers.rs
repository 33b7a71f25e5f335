// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Every handler validates its path input, calls the shared upstream client and
//! maps classified upstream failures onto HTTP responses through [`ServerError`].

use api_client::{BlockSummary, ClassifiedError, TransactionSummary, UsageStats};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use external_apis::{DEFAULT_LISTING_LIMIT, normalize_many, normalize_one};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{UniformChainStats, chains::is_chain_key, sort_by_market_cap};
use tracing::debug;

use crate::{
    config::is_valid_chain_id,
    error::ServerError,
    state::{HealthCheck, ServerState},
};

/// Health check endpoint handler
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Statistics of every chain the upstream reports, largest market cap first
///
/// # Errors
///
/// Returns `ServerError::Upstream` if the combined statistics cannot be fetched.
pub async fn stats_handler(
    State(state): State<ServerState>,
) -> Result<Json<Vec<UniformChainStats>>, ServerError> {
    let body = state.client().combined_stats().await?;
    let mut stats = normalize_many(&body);
    sort_by_market_cap(&mut stats);
    Ok(Json(stats))
}

/// Response of the tracked-chains endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainsResponse {
    /// Statistics of the chains that answered, in configured order
    pub chains: Vec<UniformChainStats>,
    /// Configured chains that could not be fetched
    pub unavailable: Vec<String>,
}

/// Statistics of every configured chain, fetched concurrently
///
/// Individual chain failures never fail the request; they are listed under
/// `unavailable`.
pub async fn chains_handler(State(state): State<ServerState>) -> Json<ChainsResponse> {
    let client = state.client();
    let chains = client.fetch_all_chain_stats().await;
    let unavailable = client
        .config()
        .chains
        .iter()
        .filter(|requested| !chains.iter().any(|stats| &stats.id == *requested))
        .cloned()
        .collect();

    Json(ChainsResponse { chains, unavailable })
}

/// Normalized statistics of a single chain
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed chain identifier,
/// or `ServerError::Upstream` if the statistics cannot be fetched or read.
pub async fn chain_stats_handler(
    State(state): State<ServerState>,
    Path(chain): Path<String>,
) -> Result<Json<UniformChainStats>, ServerError> {
    validate_chain(&chain)?;
    let body = state.client().chain_stats(&chain).await?;
    normalize_one(&chain, &body).map(Json).ok_or_else(|| {
        ClassifiedError::invalid_response(format!("no statistics for {chain}")).into()
    })
}

/// Query parameters of the listing endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListingQuery {
    /// Number of rows, clamped upstream to `1..=100`
    pub limit: Option<u32>,
}

impl ListingQuery {
    fn limit(self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LISTING_LIMIT)
    }
}

/// Most recent blocks of a chain
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed chain identifier,
/// or `ServerError::Upstream` if the listing cannot be fetched.
pub async fn blocks_handler(
    State(state): State<ServerState>,
    Path(chain): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<BlockSummary>>, ServerError> {
    validate_chain(&chain)?;
    let blocks = state.client().recent_blocks(&chain, query.limit()).await?;
    Ok(Json(blocks))
}

/// Most recent transactions of a chain
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed chain identifier,
/// or `ServerError::Upstream` if the listing cannot be fetched.
pub async fn transactions_handler(
    State(state): State<ServerState>,
    Path(chain): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<TransactionSummary>>, ServerError> {
    validate_chain(&chain)?;
    let transactions = state
        .client()
        .recent_transactions(&chain, query.limit())
        .await?;
    Ok(Json(transactions))
}

/// Address dashboard of a chain
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for malformed input, or
/// `ServerError::Upstream` if the dashboard cannot be fetched.
pub async fn address_handler(
    State(state): State<ServerState>,
    Path((chain, address)): Path<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    validate_chain(&chain)?;
    validate_lookup_key("address", &address)?;
    let dashboard = state.client().address_dashboard(&chain, &address).await?;
    Ok(Json(dashboard))
}

/// Transaction dashboard of a chain
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for malformed input, or
/// `ServerError::Upstream` if the dashboard cannot be fetched.
pub async fn transaction_handler(
    State(state): State<ServerState>,
    Path((chain, hash)): Path<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    validate_chain(&chain)?;
    validate_lookup_key("transaction hash", &hash)?;
    let dashboard = state.client().transaction_dashboard(&chain, &hash).await?;
    Ok(Json(dashboard))
}

/// Quota usage with derived percentages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageReport {
    /// Counters as reported upstream
    #[serde(flatten)]
    pub usage: UsageStats,
    /// Share of the hourly allowance spent, in percent
    pub hourly_usage_pct: f64,
    /// Share of the daily allowance spent, in percent
    pub daily_usage_pct: f64,
}

impl From<UsageStats> for UsageReport {
    fn from(usage: UsageStats) -> Self {
        Self {
            hourly_usage_pct: usage.hourly_usage_pct(),
            daily_usage_pct: usage.daily_usage_pct(),
            usage,
        }
    }
}

/// Quota usage of the configured API key
///
/// # Errors
///
/// Returns `ServerError::Upstream` with `CREDENTIAL_REQUIRED` when no key is
/// configured, or the classified upstream failure.
pub async fn usage_handler(
    State(state): State<ServerState>,
) -> Result<Json<UsageReport>, ServerError> {
    let usage = state.client().usage_stats().await?;
    Ok(Json(usage.into()))
}

fn validate_chain(chain: &str) -> Result<(), ServerError> {
    if is_valid_chain_id(chain) && is_chain_key(chain) {
        return Ok(());
    }
    debug!(chain, "rejected chain identifier");
    Err(ServerError::ValidationError(format!(
        "invalid chain identifier: {chain:?}"
    )))
}

fn validate_lookup_key(what: &str, value: &str) -> Result<(), ServerError> {
    let well_formed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-' | '.'))
        && value.chars().any(|c| c.is_ascii_alphanumeric());
    if value.len() <= 256 && well_formed {
        return Ok(());
    }
    Err(ServerError::ValidationError(format!("invalid {what}")))
}
