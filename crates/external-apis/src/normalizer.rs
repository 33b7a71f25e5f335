// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Conversion of raw statistics payloads into [`UniformChainStats`]
//!
//! Chain families report progress under different field names. Each payload is
//! matched against [`SCHEMA_RULES`] in order; the first rule whose predicate
//! holds decides the [`SchemaVariant`] and which fields carry the counter and
//! its timestamp. Payloads that match no rule still produce a row, with the
//! counter and time read from generic fields or defaulted.

use api_client::parse_upstream_time;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use shared_types::{BlockLabel, EPOCH_CHAIN, UniformChainStats, chains::is_chain_key};
use tracing::{debug, trace};

type Fields = Map<String, Value>;

/// Recognized statistics schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Counts mined blocks (`blocks`)
    BlockCount,
    /// Reports the best block height (`best_block_height`)
    BlockHeight,
    /// Counts closed ledgers (`ledgers`)
    LedgerCount,
    /// Counts consensus epochs (`epochs`) on the epoch chain
    EpochCount,
    /// None of the above; generic `height`/`time` fields are used if present
    Unrecognized,
}

impl SchemaVariant {
    /// Label describing the progress counter of this schema
    pub const fn label(self) -> BlockLabel {
        match self {
            Self::BlockCount | Self::BlockHeight | Self::Unrecognized => BlockLabel::Block,
            Self::LedgerCount => BlockLabel::Ledger,
            Self::EpochCount => BlockLabel::Epoch,
        }
    }
}

/// One entry of the schema resolution table
#[derive(Debug)]
pub struct SchemaRule {
    /// Variant produced when the rule matches
    pub variant: SchemaVariant,
    matches: fn(&str, &Fields) -> bool,
    counter_field: &'static str,
    time_field: &'static str,
}

/// Schema resolution table, evaluated in order
pub const SCHEMA_RULES: &[SchemaRule] = &[
    SchemaRule {
        variant: SchemaVariant::BlockCount,
        matches: has_blocks,
        counter_field: "blocks",
        time_field: "best_block_time",
    },
    SchemaRule {
        variant: SchemaVariant::BlockHeight,
        matches: has_block_height,
        counter_field: "best_block_height",
        time_field: "best_block_time",
    },
    SchemaRule {
        variant: SchemaVariant::LedgerCount,
        matches: has_ledgers,
        counter_field: "ledgers",
        time_field: "best_ledger_time",
    },
    SchemaRule {
        variant: SchemaVariant::EpochCount,
        matches: is_epoch_chain,
        counter_field: "epochs",
        time_field: "best_epoch_time",
    },
];

fn has_blocks(_: &str, fields: &Fields) -> bool {
    fields.contains_key("blocks")
}

fn has_block_height(_: &str, fields: &Fields) -> bool {
    fields.contains_key("best_block_height")
}

fn has_ledgers(_: &str, fields: &Fields) -> bool {
    fields.contains_key("ledgers")
}

fn is_epoch_chain(chain: &str, fields: &Fields) -> bool {
    chain == EPOCH_CHAIN && fields.contains_key("epochs")
}

const FALLBACK_COUNTER_FIELD: &str = "height";
const FALLBACK_TIME_FIELD: &str = "time";

/// Ordered fee candidates; the first usable value wins
const FEE_FIELDS: &[&str] = &[
    "average_transaction_fee_usd_24h",
    "suggested_transaction_fee_usd",
];

/// Resolve the schema of a per-chain statistics object
pub fn resolve_schema(chain: &str, fields: &Fields) -> SchemaVariant {
    SCHEMA_RULES
        .iter()
        .find(|rule| (rule.matches)(chain, fields))
        .map_or(SchemaVariant::Unrecognized, |rule| rule.variant)
}

/// Normalize a single-chain response body
///
/// Returns `None` when the body has no object `data` section. The data section
/// is either the statistics object itself or a map keyed by `chain`.
pub fn normalize_one(chain: &str, payload: &Value) -> Option<UniformChainStats> {
    let data = payload.get("data")?.as_object()?;
    let fields = data
        .get(chain)
        .and_then(Value::as_object)
        .unwrap_or(data);
    Some(normalize_fields(chain, fields))
}

/// Normalize a combined multi-chain payload
///
/// Accepts either the full response body (the `data` section is used) or the
/// chain map itself. A body whose `data` section is null or not an object has
/// no chains. Keys are compared case-insensitively: the `cross-chain` aggregate
/// is skipped in any casing, as are non-object entries; entries wrapped in their
/// own `data` object are unwrapped. The result is unranked; callers order it with
/// [`shared_types::sort_by_market_cap`].
pub fn normalize_many(payload: &Value) -> Vec<UniformChainStats> {
    let chains = match payload.get("data") {
        Some(data) => data.as_object(),
        None => payload.as_object(),
    };
    let Some(chains) = chains else {
        debug!("combined payload carries no chain map");
        return Vec::new();
    };

    chains
        .iter()
        .filter_map(|(key, entry)| {
            let chain = key.to_ascii_lowercase();
            if !is_chain_key(&chain) {
                return None;
            }
            let entry = entry.as_object()?;
            let fields = entry
                .get("data")
                .and_then(Value::as_object)
                .unwrap_or(entry);
            Some(normalize_fields(&chain, fields))
        })
        .collect()
}

/// Map one per-chain statistics object onto the uniform record
pub fn normalize_fields(chain: &str, fields: &Fields) -> UniformChainStats {
    let chain = chain.to_ascii_lowercase();
    let chain = chain.as_str();
    let variant = resolve_schema(chain, fields);
    let (counter_field, time_field) = SCHEMA_RULES
        .iter()
        .find(|rule| rule.variant == variant)
        .map_or((FALLBACK_COUNTER_FIELD, FALLBACK_TIME_FIELD), |rule| {
            (rule.counter_field, rule.time_field)
        });

    if variant == SchemaVariant::Unrecognized {
        debug!(chain, "unrecognized statistics schema, using generic fields");
    }

    let mut stats = UniformChainStats::new(chain);
    stats.block_label = variant.label();
    stats.block_number = read_u64(fields, counter_field).unwrap_or(0);
    if let Some(time) = read_time(fields, time_field) {
        stats.block_time = time;
    }
    stats.price_usd = non_negative(read_f64(fields, "market_price_usd"));
    stats.fee_usd = non_negative(
        FEE_FIELDS
            .iter()
            .find_map(|field| read_f64(fields, field).filter(|fee| *fee > 0.0)),
    );
    stats.market_cap_usd = read_f64(fields, "market_cap_usd");
    stats.dominance_pct = read_f64(fields, "market_dominance_percentage");
    stats.change_24h_pct = read_f64(fields, "market_price_usd_change_24h_percentage");
    stats.volume_24h_usd = read_f64(fields, "volume_24h");
    stats.transactions_24h = read_u64(fields, "transactions_24h");

    trace!(
        chain,
        ?variant,
        block_number = stats.block_number,
        "normalized chain statistics"
    );
    stats
}

fn non_negative(value: Option<f64>) -> f64 {
    value.map_or(0.0, |v| v.max(0.0))
}

/// Read a finite number given as a JSON number or a numeric string
pub fn read_f64(fields: &Fields, key: &str) -> Option<f64> {
    let value = match fields.get(key)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Read a non-negative integer given as a JSON number or a numeric string
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn read_u64(fields: &Fields, key: &str) -> Option<u64> {
    if let Some(value) = fields.get(key).and_then(Value::as_u64) {
        return Some(value);
    }
    if let Some(Value::String(text)) = fields.get(key)
        && let Ok(value) = text.trim().parse::<u64>()
    {
        return Some(value);
    }
    read_f64(fields, key)
        .filter(|value| *value >= 0.0 && *value <= u64::MAX as f64)
        .map(|value| value as u64)
}

/// Read a timestamp given as `YYYY-MM-DD HH:MM:SS` (UTC), RFC 3339 or Unix seconds
pub fn read_time(fields: &Fields, key: &str) -> Option<DateTime<Utc>> {
    match fields.get(key)? {
        Value::String(text) => parse_upstream_time(text.trim())
            .or_else(|| text.trim().parse::<i64>().ok().and_then(from_unix)),
        Value::Number(number) => number.as_i64().and_then(from_unix),
        _ => None,
    }
}

fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}
