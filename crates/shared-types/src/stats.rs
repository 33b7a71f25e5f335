// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Uniform per-chain statistics record
//!
//! Every chain family reports its progress differently (block height, ledger
//! count, epoch number). [`UniformChainStats`] carries that counter in a single
//! field together with a [`BlockLabel`] describing what it counts, so consumers
//! never branch on the upstream schema.

use std::{cmp::Ordering, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::chains;

/// What the progress counter of a chain counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockLabel {
    /// Mined or produced blocks
    #[default]
    #[serde(rename = "Latest block")]
    Block,
    /// Closed ledgers
    #[serde(rename = "Latest ledger")]
    Ledger,
    /// Consensus epochs
    #[serde(rename = "Latest epoch")]
    Epoch,
}

impl BlockLabel {
    /// Human-readable label
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "Latest block",
            Self::Ledger => "Latest ledger",
            Self::Epoch => "Latest epoch",
        }
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized statistics for one chain
///
/// Optional metrics stay `None` in memory when the upstream omits them and are
/// written as `0` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformChainStats {
    /// Lowercase upstream identifier, never empty
    pub id: String,
    /// Display name resolved from the label table
    pub display_name: String,
    /// Ticker symbol resolved from the label table
    pub symbol: String,
    /// Price of the native asset in USD
    pub price_usd: f64,
    /// Progress counter (block height, ledger count or epoch number)
    pub block_number: u64,
    /// Timestamp of the unit counted by `block_number`
    pub block_time: DateTime<Utc>,
    /// What `block_number` counts
    pub block_label: BlockLabel,
    /// Typical transaction fee in USD
    pub fee_usd: f64,
    /// Market capitalization in USD
    #[serde(serialize_with = "zero_if_absent")]
    pub market_cap_usd: Option<f64>,
    /// Share of total crypto market capitalization, in percent
    #[serde(serialize_with = "zero_if_absent")]
    pub dominance_pct: Option<f64>,
    /// Price change over the last 24 hours, in percent
    #[serde(serialize_with = "zero_if_absent")]
    pub change_24h_pct: Option<f64>,
    /// Trading volume over the last 24 hours in USD
    #[serde(serialize_with = "zero_if_absent")]
    pub volume_24h_usd: Option<f64>,
    /// Transactions over the last 24 hours
    #[serde(serialize_with = "zero_if_absent")]
    pub transactions_24h: Option<u64>,
}

impl UniformChainStats {
    /// Create a record with labels resolved and every metric at its default
    ///
    /// The progress counter starts at zero and the time at `now`, so a record
    /// built from an unrecognized payload is still renderable.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: chains::display_name(&id),
            symbol: chains::symbol(&id),
            id,
            price_usd: 0.0,
            block_number: 0,
            block_time: Utc::now(),
            block_label: BlockLabel::Block,
            fee_usd: 0.0,
            market_cap_usd: None,
            dominance_pct: None,
            change_24h_pct: None,
            volume_24h_usd: None,
            transactions_24h: None,
        }
    }

    /// Market capitalization with an unknown value treated as zero
    pub fn market_cap_or_zero(&self) -> f64 {
        self.market_cap_usd.unwrap_or(0.0)
    }

    /// Ordering used for ranked listings: market cap descending, then price descending
    pub fn cmp_by_market_cap(&self, other: &Self) -> Ordering {
        other
            .market_cap_or_zero()
            .total_cmp(&self.market_cap_or_zero())
            .then_with(|| other.price_usd.total_cmp(&self.price_usd))
    }
}

fn zero_if_absent<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Copy + Default + Serialize,
    S: Serializer,
{
    value.unwrap_or_default().serialize(serializer)
}

/// Sort records by descending market cap, breaking ties by descending price
pub fn sort_by_market_cap(stats: &mut [UniformChainStats]) {
    stats.sort_by(UniformChainStats::cmp_by_market_cap);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(id: &str, market_cap: Option<f64>, price: f64) -> UniformChainStats {
        UniformChainStats {
            market_cap_usd: market_cap,
            price_usd: price,
            ..UniformChainStats::new(id)
        }
    }

    fn ids(stats: &[UniformChainStats]) -> Vec<&str> {
        stats.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn new_resolves_labels() {
        let stats = UniformChainStats::new("litecoin");
        assert_eq!(stats.display_name, "Litecoin");
        assert_eq!(stats.symbol, "LTC");
        assert_eq!(stats.block_number, 0);
        assert_eq!(stats.block_label, BlockLabel::Block);
    }

    #[test]
    fn sorts_by_market_cap_descending() {
        let mut stats = vec![ranked("small", Some(50.0), 1.0), ranked("large", Some(100.0), 1.0)];
        sort_by_market_cap(&mut stats);
        assert_eq!(ids(&stats), ["large", "small"]);
    }

    #[test]
    fn equal_market_cap_sorts_by_price_descending() {
        let mut stats = vec![ranked("cheap", Some(100.0), 5.0), ranked("dear", Some(100.0), 9.0)];
        sort_by_market_cap(&mut stats);
        assert_eq!(ids(&stats), ["dear", "cheap"]);
    }

    #[test]
    fn unknown_market_cap_sorts_as_zero() {
        let mut stats = vec![
            ranked("unknown", None, 1000.0),
            ranked("tiny", Some(1.0), 0.1),
            ranked("zero", Some(0.0), 2000.0),
        ];
        sort_by_market_cap(&mut stats);
        assert_eq!(ids(&stats), ["tiny", "zero", "unknown"]);
    }

    #[test]
    fn block_label_serializes_as_text() {
        let json = serde_json::to_string(&BlockLabel::Ledger).unwrap();
        assert_eq!(json, "\"Latest ledger\"");
        assert_eq!(BlockLabel::Epoch.to_string(), "Latest epoch");
    }

    #[test]
    fn serializes_camel_case_fields() {
        let value = serde_json::to_value(UniformChainStats::new("bitcoin")).unwrap();
        assert_eq!(value["displayName"], "Bitcoin");
        assert_eq!(value["blockLabel"], "Latest block");
        assert!(value.get("marketCapUsd").is_some());
    }

    #[test]
    fn absent_metrics_serialize_as_zero() {
        let stats = UniformChainStats {
            volume_24h_usd: Some(1.5e9),
            ..UniformChainStats::new("bitcoin")
        };
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["marketCapUsd"], 0.0);
        assert_eq!(value["dominancePct"], 0.0);
        assert_eq!(value["change24hPct"], 0.0);
        assert_eq!(value["transactions24h"], 0);
        assert_eq!(value["volume24hUsd"], 1.5e9);
    }
}
