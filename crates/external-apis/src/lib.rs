// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockchair integration for multi-chain statistics
//!
//! This crate implements the `StatsApi` trait for the Blockchair API and turns its
//! loosely typed responses into uniform per-chain records.
//!
//! # Architecture
//!
//! - **Client**: [`blockchair`] - request building, cached transport and typed endpoints
//! - **Normalization**: [`normalizer`] - ordered schema rules mapping block, ledger and
//!   epoch based chains onto [`shared_types::UniformChainStats`]
//! - **Fan-out**: [`aggregator`] - concurrent per-chain requests that tolerate partial failure
//!
//! # Features
//!
//! - **Bounded Retries**: Transient failures back off exponentially, client errors never repeat
//! - **Response Caching**: Successful bodies are reused for a per-endpoint TTL
//! - **Credential Optional**: Requests run anonymously unless an API key is configured
//! - **Testing Support**: Integration tests use wiremock for HTTP simulation

pub mod aggregator;
pub mod blockchair;
pub mod normalizer;

pub use aggregator::fan_out;
pub use blockchair::*;
pub use normalizer::{SchemaVariant, normalize_fields, normalize_many, normalize_one};
