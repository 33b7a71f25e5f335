// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Concurrent per-chain statistics with partial-failure tolerance

use api_client::StatsApi;
use futures::future::join_all;
use shared_types::UniformChainStats;
use tracing::{debug, warn};

use crate::normalizer::normalize_one;

/// Fetch and normalize statistics for every chain in `chains`
///
/// All requests run concurrently on the calling task. A chain whose request
/// fails, or whose body carries no statistics, is logged and left out; the
/// remaining results keep the order of `chains`.
pub async fn fan_out<S, C>(source: &S, chains: &[C]) -> Vec<UniformChainStats>
where
    S: StatsApi,
    C: AsRef<str>,
{
    let requests = chains.iter().map(|chain| async move {
        let chain = chain.as_ref();
        (chain, source.chain_stats(chain).await)
    });

    let results: Vec<_> = join_all(requests)
        .await
        .into_iter()
        .filter_map(|(chain, result)| match result {
            Ok(body) => {
                let stats = normalize_one(chain, &body);
                if stats.is_none() {
                    warn!(source = source.name(), chain, "response carried no statistics");
                }
                stats
            }
            Err(error) => {
                warn!(
                    source = source.name(),
                    chain,
                    kind = %error.kind,
                    status = ?error.status,
                    detail = ?error.detail,
                    "chain statistics unavailable, skipping"
                );
                None
            }
        })
        .collect();

    debug!(
        requested = chains.len(),
        succeeded = results.len(),
        "fan-out complete"
    );
    results
}
