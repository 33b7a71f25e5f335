// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Response envelope and typed payloads returned by the statistics API

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Layout of upstream timestamps such as `2024-01-01 00:00:00` (always UTC)
pub const UPSTREAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Standard response envelope: `{ "data": ..., "context": { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    /// Endpoint payload, absent or null when the upstream has nothing to report
    pub data: Option<T>,
    /// Request metadata
    pub context: Option<ResponseContext>,
}

/// Request metadata attached to every upstream response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseContext {
    /// Upstream status code echoed in the body
    #[serde(default)]
    pub code: Option<u16>,
    /// Upstream cache information
    #[serde(default)]
    pub cache: Option<Value>,
    /// API version and deprecation notices
    #[serde(default)]
    pub api: Option<Value>,
    /// Quota units billed for the request
    #[serde(default)]
    pub request_cost: Option<f64>,
    /// Error reported in-band
    #[serde(default)]
    pub error: Option<String>,
}

impl ResponseContext {
    /// Extract the context object from a raw response body, if present
    pub fn from_body(body: &Value) -> Option<Self> {
        body.get("context")
            .and_then(|context| Self::deserialize(context).ok())
    }
}

/// A recently produced block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block height
    pub id: u64,
    /// Block hash
    pub hash: String,
    /// Block timestamp
    #[serde(deserialize_with = "upstream_time")]
    pub time: DateTime<Utc>,
    /// Transactions included in the block
    #[serde(default)]
    pub transaction_count: Option<u64>,
    /// Block size in bytes
    #[serde(default)]
    pub size: Option<u64>,
}

/// A recently seen transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction hash
    pub hash: String,
    /// First-seen or confirmation time
    #[serde(deserialize_with = "upstream_time")]
    pub time: DateTime<Utc>,
    /// Containing block, `-1` while the transaction sits in the mempool
    pub block_id: i64,
    /// Fee in the chain's smallest unit
    #[serde(default)]
    pub fee: Option<f64>,
    /// Sum of inputs in the chain's smallest unit
    #[serde(default)]
    pub input_total: Option<f64>,
    /// Sum of outputs in the chain's smallest unit
    #[serde(default)]
    pub output_total: Option<f64>,
}

/// Quota usage of the configured API key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageStats {
    /// Requests left on the current plan
    pub requests_left: u64,
    /// Hourly allowance
    pub requests_per_hour: u64,
    /// Requests left this hour
    pub requests_per_hour_left: u64,
    /// Daily allowance
    pub requests_per_day: u64,
    /// Requests left today
    pub requests_per_day_left: u64,
    /// Plan name
    pub plan: String,
}

impl UsageStats {
    /// Share of the hourly allowance already spent, in percent
    pub fn hourly_usage_pct(&self) -> f64 {
        usage_pct(self.requests_per_hour, self.requests_per_hour_left)
    }

    /// Share of the daily allowance already spent, in percent
    pub fn daily_usage_pct(&self) -> f64 {
        usage_pct(self.requests_per_day, self.requests_per_day_left)
    }
}

#[allow(clippy::cast_precision_loss)]
fn usage_pct(total: u64, left: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(left) as f64 / total as f64 * 100.0
}

/// Parse an upstream timestamp: `YYYY-MM-DD HH:MM:SS` (UTC) or RFC 3339
pub fn parse_upstream_time(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, UPSTREAM_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}

fn upstream_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_upstream_time(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {text}")))
}
