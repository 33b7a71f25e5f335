// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded exponential-backoff retry for classified operations
//!
//! [`retry`] runs an async operation until it succeeds, fails with a
//! non-retryable [`ClassifiedError`], or exhausts the [`RetryPolicy`]. Attempts
//! never overlap; the delay before retry `k` (1-based) is
//! `base_delay * 2^(k-1)`, capped at `max_delay`.

use std::{future::Future, time::Duration};

use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::error::ClassifiedError;

/// Retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Ceiling for any single backoff delay
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(30);

/// How many times, and how patiently, to retry a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Ceiling for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: MAX_BACKOFF_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default ceiling
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: MAX_BACKOFF_DELAY,
        }
    }

    /// Policy that attempts exactly once
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before the retry following attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// The full backoff schedule, one entry per retry
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let policy = *self;
        (0..policy.max_retries).map(move |attempt| policy.delay_for(attempt))
    }
}

/// Run `operation` under `policy`
///
/// Returns the first success, or the last observed error once a
/// non-retryable failure occurs or the retries are exhausted.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, ClassifiedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError>>,
{
    let mut attempt = 0u32;
    let max_attempts = policy.max_retries + 1;

    RetryIf::start(policy.delays(), operation, |error: &ClassifiedError| {
        attempt += 1;
        if error.retryable {
            warn!(
                attempt,
                max_attempts,
                kind = %error.kind,
                status = ?error.status,
                detail = ?error.detail,
                "upstream request failed"
            );
        } else {
            debug!(
                attempt,
                kind = %error.kind,
                status = ?error.status,
                "non-retryable failure, giving up"
            );
        }
        error.retryable
    })
    .await
}
