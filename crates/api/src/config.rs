// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the chain statistics
//! server, supporting different environments and validation of configuration parameters.

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use api_client::RetryPolicy;
use config::{Config, ConfigBuilder, ConfigError, Environment as ConfigEnv, File, builder::DefaultState};
use external_apis::{BlockchairConfig, CacheTtls, DEFAULT_BASE_URL};
use serde::{Deserialize, Deserializer, Serialize, de};
use shared_types::{DEFAULT_TRACKED_CHAINS, chains::is_chain_key};
use url::Url;

use crate::error::{ServerError, ServerResult};

/// Environment variable that overrides the Blockchair API key
pub const API_KEY_ENV: &str = "BLOCKCHAIR_API_KEY";

/// Default limit for a single upstream attempt, in seconds
///
/// Three attempts plus backoff stay inside the default 30 second request timeout.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 8;

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // re-validated in `ServerConfig::load` once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Default limit for one upstream attempt
    pub const fn upstream_default() -> Self {
        Self(Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECONDS))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Cache lifetimes in seconds, per endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtlSettings {
    /// Single-chain statistics
    pub chain_stats_seconds: u64,
    /// Combined statistics
    pub combined_stats_seconds: u64,
    /// Block and transaction listings
    pub listings_seconds: u64,
    /// Address and transaction dashboards
    pub dashboards_seconds: u64,
    /// Premium usage statistics
    pub usage_seconds: u64,
}

impl Default for CacheTtlSettings {
    fn default() -> Self {
        let ttls = CacheTtls::default();
        Self {
            chain_stats_seconds: ttls.chain_stats.as_secs(),
            combined_stats_seconds: ttls.combined_stats.as_secs(),
            listings_seconds: ttls.listings.as_secs(),
            dashboards_seconds: ttls.dashboards.as_secs(),
            usage_seconds: ttls.usage.as_secs(),
        }
    }
}

impl From<CacheTtlSettings> for CacheTtls {
    fn from(settings: CacheTtlSettings) -> Self {
        Self {
            chain_stats: Duration::from_secs(settings.chain_stats_seconds),
            combined_stats: Duration::from_secs(settings.combined_stats_seconds),
            listings: Duration::from_secs(settings.listings_seconds),
            dashboards: Duration::from_secs(settings.dashboards_seconds),
            usage: Duration::from_secs(settings.usage_seconds),
        }
    }
}

/// Upstream Blockchair settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchairSettings {
    /// API base URL
    pub base_url: String,
    /// API key; requests are anonymous when absent
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request timeout (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Chains served by `/v1/chains`
    pub chains: Vec<String>,
    /// Response cache lifetimes
    #[serde(default)]
    pub cache: CacheTtlSettings,
}

impl Default for BlockchairSettings {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_seconds: TimeoutSeconds::upstream_default(),
            max_retries: retry.max_retries,
            base_delay_ms: duration_millis(retry.base_delay),
            chains: DEFAULT_TRACKED_CHAINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            cache: CacheTtlSettings::default(),
        }
    }
}

impl BlockchairSettings {
    /// Retry policy described by these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }

    /// Longest time one client call can take: every attempt timing out plus
    /// the full backoff schedule
    pub fn worst_case_duration(&self) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        let waiting: Duration = self.retry_policy().delays().sum();
        self.timeout_seconds
            .value()
            .saturating_mul(attempts)
            .saturating_add(waiting)
    }

    /// Client configuration described by these settings
    pub fn client_config(&self) -> BlockchairConfig {
        BlockchairConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout_seconds: self.timeout_seconds.value().as_secs(),
            retry: self.retry_policy(),
            ttls: self.cache.into(),
            chains: self.chains.clone(),
        }
    }

    /// Reject settings the client cannot work with
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse, no chains are tracked,
    /// a chain identifier is not a lowercase upstream key or `max_retries`
    /// exceeds 10
    pub fn validate(&self) -> Result<()> {
        let base_url = Url::parse(&self.base_url)?;
        ensure!(!base_url.cannot_be_a_base(), "base URL cannot carry a path: {base_url}");
        ensure!(!self.chains.is_empty(), "at least one chain must be tracked");
        for chain in &self.chains {
            ensure!(
                is_chain_key(chain) && is_valid_chain_id(chain),
                "invalid chain identifier: {chain:?}"
            );
        }
        ensure!(self.max_retries <= 10, "max_retries cannot exceed 10");
        Ok(())
    }
}

/// Whether `chain` looks like an upstream chain identifier (`bitcoin-cash`)
pub fn is_valid_chain_id(chain: &str) -> bool {
    !chain.is_empty()
        && chain
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Upstream API settings
    #[serde(default)]
    pub blockchair: BlockchairSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            blockchair: BlockchairSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER__` prefix (`SERVER__BLOCKCHAIR__MAX_RETRIES`)
    /// 5. `BLOCKCHAIR_API_KEY` for the upstream credential
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Self::defaults()?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("blockchair.chains")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            config_builder = config_builder.set_override("blockchair.api_key", api_key)?;
        }

        Self::from_config(config_builder.build()?)
    }

    /// Default values for every setting
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let blockchair = BlockchairSettings::default();
        let ttls = blockchair.cache;
        Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .set_default("blockchair.base_url", DEFAULT_BASE_URL)?
            .set_default("blockchair.timeout_seconds", DEFAULT_UPSTREAM_TIMEOUT_SECONDS)?
            .set_default("blockchair.max_retries", blockchair.max_retries)?
            .set_default("blockchair.base_delay_ms", blockchair.base_delay_ms)?
            .set_default("blockchair.chains", blockchair.chains)?
            .set_default("blockchair.cache.chain_stats_seconds", ttls.chain_stats_seconds)?
            .set_default("blockchair.cache.combined_stats_seconds", ttls.combined_stats_seconds)?
            .set_default("blockchair.cache.listings_seconds", ttls.listings_seconds)?
            .set_default("blockchair.cache.dashboards_seconds", ttls.dashboards_seconds)?
            .set_default("blockchair.cache.usage_seconds", ttls.usage_seconds)
    }

    /// Deserialize and validate a built configuration
    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        server_config
            .blockchair
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid blockchair configuration: {e}")))?;

        server_config
            .validate_timeout_budget()
            .map_err(|e| ConfigError::Message(format!("invalid timeout configuration: {e}")))?;

        Ok(server_config)
    }

    /// Check that a request can outlive every retry of its upstream call
    ///
    /// # Errors
    ///
    /// Returns an error if the request timeout would cut off the retry schedule
    pub fn validate_timeout_budget(&self) -> Result<()> {
        let request = self.timeout_seconds.value();
        let upstream = self.blockchair.worst_case_duration();
        ensure!(
            upstream < request,
            "request timeout of {}s is shorter than the worst-case upstream call of {:.1}s; \
             raise timeout_seconds or lower blockchair.timeout_seconds, max_retries or base_delay_ms",
            request.as_secs(),
            upstream.as_secs_f64()
        );
        Ok(())
    }

    /// Create configuration optimized for testing
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(), // let OS choose available port
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            blockchair: BlockchairSettings {
                timeout_seconds: TimeoutSeconds(Duration::from_secs(1)),
                base_delay_ms: 100,
                ..BlockchairSettings::default()
            },
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
