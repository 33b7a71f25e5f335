// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the chain statistics service
//!
//! This crate provides the chain label table and the uniform statistics record
//! that are shared across the client, normalizer and HTTP crates.

pub mod chains;
pub mod stats;

pub use chains::{CROSS_CHAIN_KEY, ChainLabel, DEFAULT_TRACKED_CHAINS, EPOCH_CHAIN};
pub use stats::{BlockLabel, UniformChainStats, sort_by_market_cap};
