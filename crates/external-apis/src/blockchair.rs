// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockchair statistics API integration
//!
//! [`BlockchairClient`] composes three layers for every request:
//!
//! 1. [`RequestBuilder`] turns path segments and query parameters into a URL,
//!    appending the API key only when one is configured.
//! 2. [`BlockchairClient::fetch_cached`] answers from the [`ResponseCache`] when
//!    it can and otherwise performs one HTTP exchange, caching successful bodies
//!    under the exact URL.
//! 3. [`retry`] repeats the exchange under the configured [`RetryPolicy`],
//!    giving up at once on client errors.

use std::{sync::Arc, time::Duration};

use api_client::{
    ApiEnvelope, BlockSummary, CacheStats, ClassifiedError, ResponseCache, ResponseContext,
    RetryPolicy, StatsApi, TransactionSummary, UsageStats, retry,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{DEFAULT_TRACKED_CHAINS, UniformChainStats};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

use crate::aggregator::fan_out;

/// Public Blockchair endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.blockchair.com";

/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "key";

/// Largest page size accepted by the listing endpoints
pub const MAX_LISTING_LIMIT: u32 = 100;

/// Page size used when callers do not choose one
pub const DEFAULT_LISTING_LIMIT: u32 = 5;

const USAGE_ENDPOINT: &str = "premium/stats";

/// Time-to-live of cached responses, per endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// `/{chain}/stats`
    pub chain_stats: Duration,
    /// `/stats`
    pub combined_stats: Duration,
    /// `/{chain}/blocks` and `/{chain}/transactions`
    pub listings: Duration,
    /// `/{chain}/dashboards/...`
    pub dashboards: Duration,
    /// `/premium/stats`
    pub usage: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            chain_stats: Duration::from_secs(30),
            combined_stats: Duration::from_secs(30),
            listings: Duration::from_secs(20),
            dashboards: Duration::from_secs(60),
            usage: Duration::from_secs(300),
        }
    }
}

/// Configuration for the Blockchair API client
#[derive(Debug, Clone)]
pub struct BlockchairConfig {
    /// Base URL for the Blockchair API
    pub base_url: String,
    /// API key; anonymous access is used when absent
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Retry policy applied to every request
    pub retry: RetryPolicy,
    /// Cache lifetimes per endpoint family
    pub ttls: CacheTtls,
    /// Chains queried by [`BlockchairClient::fetch_all_chain_stats`]
    pub chains: Vec<String>,
}

impl Default for BlockchairConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_seconds: 30,
            retry: RetryPolicy::default(),
            ttls: CacheTtls::default(),
            chains: DEFAULT_TRACKED_CHAINS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Errors raised while constructing a Blockchair client
#[derive(Debug, Error)]
pub enum BlockchairError {
    /// HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL could not be parsed
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Builds fully qualified endpoint URLs
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
    api_key: Option<String>,
}

impl RequestBuilder {
    /// Create a builder for `base_url`
    ///
    /// A blank API key is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry path segments
    pub fn new(base_url: Url, api_key: Option<String>) -> Result<Self, BlockchairError> {
        if base_url.cannot_be_a_base() {
            return Err(BlockchairError::Config(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Ok(Self { base_url, api_key })
    }

    /// Whether requests carry an API key
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Compose `{base}/{segments...}?{params}&key={api_key}`
    ///
    /// Segments are percent-encoded individually, so an address containing
    /// `/` or `?` stays a single path segment.
    pub fn build(&self, segments: &[&str], params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        if !params.is_empty() || self.api_key.is_some() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            if let Some(key) = &self.api_key {
                query.append_pair(API_KEY_PARAM, key);
            }
        }
        url
    }
}

/// Outcome of a single HTTP exchange (or cache hit)
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status; 200 for cache hits
    pub status: u16,
    /// Parsed JSON body, or the raw text wrapped in a string for non-JSON errors
    pub body: Value,
    /// Whether the body came from the cache
    pub cached: bool,
}

impl RawResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Take the body of a successful response, classifying any other status
    ///
    /// # Errors
    ///
    /// Returns the classified status for non-2xx responses
    pub fn into_body(self) -> Result<Value, ClassifiedError> {
        if self.is_success() {
            return Ok(self.body);
        }
        let detail = ResponseContext::from_body(&self.body)
            .and_then(|context| context.error)
            .unwrap_or_else(|| match &self.body {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            });
        Err(ClassifiedError::from_status(self.status, detail))
    }
}

/// Blockchair API client
#[derive(Debug)]
pub struct BlockchairClient {
    client: Client,
    requests: RequestBuilder,
    cache: Arc<ResponseCache>,
    config: BlockchairConfig,
}

impl BlockchairClient {
    /// Create a client with its own response cache
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or configuration is invalid
    pub fn new(config: BlockchairConfig) -> Result<Self, BlockchairError> {
        Self::with_cache(config, Arc::new(ResponseCache::new()))
    }

    /// Create a client sharing an existing response cache
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or configuration is invalid
    pub fn with_cache(
        config: BlockchairConfig,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, BlockchairError> {
        if config.timeout_seconds == 0 {
            return Err(BlockchairError::Config(
                "request timeout must be at least one second".to_string(),
            ));
        }

        let base_url = Url::parse(config.base_url.trim())?;
        let requests = RequestBuilder::new(base_url, config.api_key.clone())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chain-stats/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(
            base_url = %config.base_url,
            authenticated = requests.has_api_key(),
            chains = config.chains.len(),
            "created blockchair client"
        );

        Ok(Self {
            client,
            requests,
            cache,
            config,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &BlockchairConfig {
        &self.config
    }

    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.requests.has_api_key()
    }

    /// Counters of the response cache
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Perform one GET, consulting the cache first
    ///
    /// Successful bodies are cached under the full URL for `ttl`. Non-2xx
    /// responses are returned as-is and never cached.
    ///
    /// # Errors
    ///
    /// Returns a classified error when no HTTP response was received or a 2xx
    /// body is not valid JSON
    pub async fn fetch_cached(
        &self,
        url: &Url,
        ttl: Duration,
    ) -> Result<RawResponse, ClassifiedError> {
        let endpoint = url.path();

        if let Some(body) = self.cache.get(url.as_str()) {
            debug!(endpoint, "serving response from cache");
            return Ok(RawResponse {
                status: 200,
                body,
                cached: true,
            });
        }

        debug!(endpoint, "fetching from blockchair");

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.get(url.clone()).send(),
        )
        .await
        .map_err(|_| {
            ClassifiedError::network(format!(
                "GET {endpoint} timed out after {}s",
                self.config.timeout_seconds
            ))
        })?
        .map_err(|error| classify_transport(endpoint, &error))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| classify_transport(endpoint, &error))?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            debug!(
                endpoint,
                status = status.as_u16(),
                "blockchair returned an error status"
            );
            return Ok(RawResponse {
                status: status.as_u16(),
                body,
                cached: false,
            });
        }

        let body: Value = serde_json::from_slice(&bytes).map_err(|error| {
            ClassifiedError::invalid_response(format!("GET {endpoint} returned invalid JSON"))
                .with_detail(error.to_string())
        })?;

        if let Some(cost) =
            ResponseContext::from_body(&body).and_then(|context| context.request_cost)
        {
            info!(endpoint, request_cost = cost, "blockchair request billed");
        }

        self.cache.set(url.as_str(), body.clone(), ttl);

        Ok(RawResponse {
            status: status.as_u16(),
            body,
            cached: false,
        })
    }

    /// Cached, retried GET returning the body of a successful response
    async fn get_json(&self, url: Url, ttl: Duration) -> Result<Value, ClassifiedError> {
        let url = &url;
        retry(&self.config.retry, || async move {
            self.fetch_cached(url, ttl).await?.into_body()
        })
        .await
    }

    /// Cached, retried GET decoded into a typed envelope
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
        ttl: Duration,
    ) -> Result<ApiEnvelope<T>, ClassifiedError> {
        let endpoint = url.path().to_string();
        let body = self.get_json(url, ttl).await?;
        serde_json::from_value(body).map_err(|error| {
            ClassifiedError::invalid_response(format!("unexpected response shape from {endpoint}"))
                .with_detail(error.to_string())
        })
    }

    /// Raw statistics body for one chain (`GET /{chain}/stats`)
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted
    pub async fn chain_stats(&self, chain: &str) -> Result<Value, ClassifiedError> {
        let url = self.requests.build(&[chain, "stats"], &[]);
        self.get_json(url, self.config.ttls.chain_stats).await
    }

    /// Raw combined statistics body for every chain (`GET /stats`)
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted
    pub async fn combined_stats(&self) -> Result<Value, ClassifiedError> {
        let url = self.requests.build(&["stats"], &[]);
        self.get_json(url, self.config.ttls.combined_stats).await
    }

    /// Most recent blocks of a chain, newest first
    ///
    /// `limit` is clamped to `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted, or
    /// `INVALID_RESPONSE` if the listing cannot be decoded
    pub async fn recent_blocks(
        &self,
        chain: &str,
        limit: u32,
    ) -> Result<Vec<BlockSummary>, ClassifiedError> {
        let url = self
            .requests
            .build(&[chain, "blocks"], &listing_params(limit));
        let envelope: ApiEnvelope<Vec<BlockSummary>> =
            self.get_envelope(url, self.config.ttls.listings).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Most recent transactions of a chain, newest first
    ///
    /// `limit` is clamped to `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted, or
    /// `INVALID_RESPONSE` if the listing cannot be decoded
    pub async fn recent_transactions(
        &self,
        chain: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>, ClassifiedError> {
        let url = self
            .requests
            .build(&[chain, "transactions"], &listing_params(limit));
        let envelope: ApiEnvelope<Vec<TransactionSummary>> =
            self.get_envelope(url, self.config.ttls.listings).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Address dashboard (`GET /{chain}/dashboards/address/{address}`)
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted, or
    /// `INVALID_RESPONSE` if the body has no `data` section
    pub async fn address_dashboard(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Value, ClassifiedError> {
        let url = self
            .requests
            .build(&[chain, "dashboards", "address", address], &[]);
        self.dashboard(url).await
    }

    /// Transaction dashboard (`GET /{chain}/dashboards/transaction/{hash}`)
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted, or
    /// `INVALID_RESPONSE` if the body has no `data` section
    pub async fn transaction_dashboard(
        &self,
        chain: &str,
        hash: &str,
    ) -> Result<Value, ClassifiedError> {
        let url = self
            .requests
            .build(&[chain, "dashboards", "transaction", hash], &[]);
        self.dashboard(url).await
    }

    async fn dashboard(&self, url: Url) -> Result<Value, ClassifiedError> {
        let endpoint = url.path().to_string();
        let envelope: ApiEnvelope = self.get_envelope(url, self.config.ttls.dashboards).await?;
        envelope.data.ok_or_else(|| {
            ClassifiedError::invalid_response(format!("{endpoint} returned no data"))
        })
    }

    /// Quota usage of the configured API key (`GET /premium/stats`)
    ///
    /// Fails before any network access when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns `CREDENTIAL_REQUIRED` without a key, `INVALID_RESPONSE` when the
    /// plan does not expose usage statistics, or the classified failure once
    /// retries are exhausted
    pub async fn usage_stats(&self) -> Result<UsageStats, ClassifiedError> {
        if !self.has_api_key() {
            return Err(ClassifiedError::credential_required(USAGE_ENDPOINT));
        }

        let url = self.requests.build(&["premium", "stats"], &[]);
        let envelope: ApiEnvelope<UsageStats> =
            self.get_envelope(url, self.config.ttls.usage).await?;
        envelope.data.ok_or_else(|| {
            ClassifiedError::invalid_response("premium stats not available for this API plan")
        })
    }

    /// Normalized statistics of every configured chain, fetched concurrently
    ///
    /// Chains that fail are logged and left out; the result follows the
    /// configured chain order.
    pub async fn fetch_all_chain_stats(&self) -> Vec<UniformChainStats> {
        fan_out(self, &self.config.chains).await
    }
}

impl StatsApi for BlockchairClient {
    async fn chain_stats(&self, chain: &str) -> Result<Value, ClassifiedError> {
        Self::chain_stats(self, chain).await
    }

    fn name(&self) -> &'static str {
        "blockchair"
    }
}

fn listing_params(limit: u32) -> [(&'static str, String); 2] {
    [
        ("limit", limit.clamp(1, MAX_LISTING_LIMIT).to_string()),
        ("offset", "0".to_string()),
    ]
}

fn classify_transport(endpoint: &str, error: &reqwest::Error) -> ClassifiedError {
    let detail = format!("GET {endpoint}: {error}");
    match error.status() {
        Some(status) => ClassifiedError::from_status(status.as_u16(), detail),
        None => ClassifiedError::network(detail),
    }
}

#[cfg(test)]
mod tests {
    use api_client::ErrorKind;
    use serde_json::json;

    use super::*;

    fn builder(api_key: Option<&str>) -> RequestBuilder {
        RequestBuilder::new(
            Url::parse("https://api.blockchair.com").unwrap(),
            api_key.map(ToString::to_string),
        )
        .unwrap()
    }

    #[test]
    fn builds_path_without_query() {
        let url = builder(None).build(&["bitcoin", "stats"], &[]);
        assert_eq!(url.as_str(), "https://api.blockchair.com/bitcoin/stats");
    }

    #[test]
    fn appends_key_after_params() {
        let url = builder(Some("secret")).build(&["bitcoin", "blocks"], &listing_params(10));
        assert_eq!(
            url.as_str(),
            "https://api.blockchair.com/bitcoin/blocks?limit=10&offset=0&key=secret"
        );
    }

    #[test]
    fn blank_key_is_ignored() {
        let requests = builder(Some("   "));
        assert!(!requests.has_api_key());
        assert_eq!(
            requests.build(&["stats"], &[]).as_str(),
            "https://api.blockchair.com/stats"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let requests = RequestBuilder::new(Url::parse("http://localhost:8080/proxy/").unwrap(), None)
            .unwrap();
        assert_eq!(
            requests.build(&["litecoin", "stats"], &[]).as_str(),
            "http://localhost:8080/proxy/litecoin/stats"
        );
    }

    #[test]
    fn encodes_segments() {
        let url = builder(None).build(&["bitcoin", "dashboards", "address", "a/b?c"], &[]);
        assert_eq!(url.path(), "/bitcoin/dashboards/address/a%2Fb%3Fc");
    }

    #[test]
    fn rejects_non_base_url() {
        let result = RequestBuilder::new(Url::parse("mailto:ops@example.com").unwrap(), None);
        assert!(matches!(result, Err(BlockchairError::Config(_))));
    }

    #[test]
    fn listing_limit_is_clamped() {
        assert_eq!(listing_params(0)[0].1, "1");
        assert_eq!(listing_params(5)[0].1, "5");
        assert_eq!(listing_params(1000)[0].1, "100");
    }

    #[test]
    fn error_response_uses_context_error_as_detail() {
        let response = RawResponse {
            status: 402,
            body: json!({ "data": null, "context": { "code": 402, "error": "Limit reached" } }),
            cached: false,
        };
        let error = response.into_body().unwrap_err();
        assert_eq!(error.status, Some(402));
        assert_eq!(error.detail.as_deref(), Some("Limit reached"));
    }

    #[test]
    fn success_response_yields_body() {
        let response = RawResponse {
            status: 200,
            body: json!({ "data": {} }),
            cached: true,
        };
        assert_eq!(response.into_body().unwrap(), json!({ "data": {} }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = BlockchairConfig {
            timeout_seconds: 0,
            ..BlockchairConfig::default()
        };
        assert!(matches!(
            BlockchairClient::new(config),
            Err(BlockchairError::Config(_))
        ));
    }

    #[tokio::test]
    async fn usage_without_key_fails_fast() {
        let client = BlockchairClient::new(BlockchairConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..BlockchairConfig::default()
        })
        .unwrap();

        let error = client.usage_stats().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::CredentialRequired);
        assert_eq!(client.cache_stats().misses, 0);
    }
}
