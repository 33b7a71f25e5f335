// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Resilience layer for blockchain statistics API clients
//!
//! This crate holds the pieces every statistics client shares, independent of
//! which upstream API it talks to.
//!
//! # Core Abstractions
//!
//! - **`StatsApi` Trait**: Source of raw per-chain statistics payloads
//! - **Error Classification**: [`ClassifiedError`] reduces every failure to a kind and a retry decision
//! - **Retry**: [`retry`] applies bounded exponential backoff, short-circuiting on client errors
//! - **Caching**: [`ResponseCache`] stores successful bodies with a per-entry TTL
//! - **Data Types**: Response envelope, block and transaction summaries, usage quota

use serde_json::Value;

pub mod cache;
pub mod error;
pub mod retry;
pub mod types;

pub use cache::{CacheEntry, CacheStats, ResponseCache};
pub use error::{ClassifiedError, ErrorKind};
pub use retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, MAX_BACKOFF_DELAY, RetryPolicy, retry};
pub use types::*;

/// Source of raw per-chain statistics
///
/// Implemented by the concrete upstream client and by test doubles, so the
/// fan-out logic can be exercised without a network.
pub trait StatsApi: Send + Sync {
    /// Fetch the raw statistics body for one chain
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the final attempt once retries are
    /// exhausted or a non-retryable failure occurs
    fn chain_stats(&self, chain: &str) -> impl Future<Output = Result<Value, ClassifiedError>> + Send;

    /// Get the name/identifier of this source
    fn name(&self) -> &'static str;
}
