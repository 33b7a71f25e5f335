// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockchain identifiers and human-facing labels
//!
//! Chains are addressed by the lowercase identifier the upstream statistics API
//! uses in its paths (`bitcoin`, `bitcoin-cash`, `ethereum`, ...). Identifiers are
//! open-ended: the API adds chains over time, so unknown identifiers are carried
//! through unchanged and only their labels fall back to derived values.

use serde::Serialize;

/// Key of the aggregate pseudo-entry in the combined statistics payload
pub const CROSS_CHAIN_KEY: &str = "cross-chain";

/// Chain whose progress counter is an epoch number rather than a block height
pub const EPOCH_CHAIN: &str = "beacon";

/// Chains tracked by default when no explicit list is configured
pub const DEFAULT_TRACKED_CHAINS: &[&str] = &["bitcoin", "ethereum", "bitcoin-cash", "litecoin"];

/// Static labels for a known chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainLabel {
    /// Upstream identifier
    pub id: &'static str,
    /// Display name
    pub display_name: &'static str,
    /// Ticker symbol of the native asset
    pub symbol: &'static str,
}

const KNOWN_CHAINS: &[ChainLabel] = &[
    ChainLabel::new("bitcoin", "Bitcoin", "BTC"),
    ChainLabel::new("bitcoin-cash", "Bitcoin Cash", "BCH"),
    ChainLabel::new("ethereum", "Ethereum", "ETH"),
    ChainLabel::new("litecoin", "Litecoin", "LTC"),
    ChainLabel::new("dogecoin", "Dogecoin", "DOGE"),
    ChainLabel::new("dash", "Dash", "DASH"),
    ChainLabel::new("zcash", "Zcash", "ZEC"),
    ChainLabel::new("ecash", "eCash", "XEC"),
    ChainLabel::new("groestlcoin", "Groestlcoin", "GRS"),
    ChainLabel::new("monero", "Monero", "XMR"),
    ChainLabel::new("cardano", "Cardano", "ADA"),
    ChainLabel::new("ripple", "Ripple", "XRP"),
    ChainLabel::new("stellar", "Stellar", "XLM"),
    ChainLabel::new("polkadot", "Polkadot", "DOT"),
    ChainLabel::new("kusama", "Kusama", "KSM"),
    ChainLabel::new("beacon", "Beacon Chain", "ETH"),
    ChainLabel::new("base", "Base", "ETH"),
    ChainLabel::new("arbitrum", "Arbitrum One", "ARB"),
    ChainLabel::new("avalanche", "Avalanche", "AVAX"),
    ChainLabel::new("aptos", "Aptos", "APT"),
    ChainLabel::new("bnb", "BNB Chain", "BNB"),
    ChainLabel::new("polygon", "Polygon", "POL"),
    ChainLabel::new("solana", "Solana", "SOL"),
    ChainLabel::new("tron", "Tron", "TRX"),
    ChainLabel::new("ton", "TON", "TON"),
    ChainLabel::new("tezos", "Tezos", "XTZ"),
    ChainLabel::new("eos", "EOS", "EOS"),
    ChainLabel::new("mixin", "Mixin", "XIN"),
];

impl ChainLabel {
    const fn new(id: &'static str, display_name: &'static str, symbol: &'static str) -> Self {
        Self {
            id,
            display_name,
            symbol,
        }
    }

    /// Look up the labels of a known chain
    pub fn lookup(id: &str) -> Option<&'static Self> {
        KNOWN_CHAINS.iter().find(|label| label.id == id)
    }

    /// All chains with static labels
    pub const fn all() -> &'static [Self] {
        KNOWN_CHAINS
    }
}

/// Display name for a chain identifier, falling back to the identifier itself
pub fn display_name(id: &str) -> String {
    ChainLabel::lookup(id).map_or_else(|| id.to_string(), |label| label.display_name.to_string())
}

/// Ticker symbol for a chain identifier, falling back to the uppercased identifier
pub fn symbol(id: &str) -> String {
    ChainLabel::lookup(id).map_or_else(|| id.to_uppercase(), |label| label.symbol.to_string())
}

/// Whether an identifier names a real chain rather than an aggregate entry
pub fn is_chain_key(id: &str) -> bool {
    !id.is_empty() && id != CROSS_CHAIN_KEY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_chain_labels() {
        assert_eq!(display_name("bitcoin-cash"), "Bitcoin Cash");
        assert_eq!(symbol("bitcoin-cash"), "BCH");
        assert_eq!(display_name("ripple"), "Ripple");
        assert_eq!(symbol("beacon"), "ETH");
    }

    #[test]
    fn unknown_chain_falls_back_to_identifier() {
        assert_eq!(display_name("flare"), "flare");
        assert_eq!(symbol("flare"), "FLARE");
    }

    #[test]
    fn identifiers_are_unique() {
        let mut ids: Vec<_> = ChainLabel::all().iter().map(|label| label.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ChainLabel::all().len());
    }

    #[test]
    fn cross_chain_is_not_a_chain() {
        assert!(!is_chain_key(CROSS_CHAIN_KEY));
        assert!(!is_chain_key(""));
        assert!(is_chain_key("litecoin"));
    }

    #[test]
    fn default_tracked_chains_have_labels() {
        for id in DEFAULT_TRACKED_CHAINS {
            assert!(ChainLabel::lookup(id).is_some(), "missing label for {id}");
        }
    }
}
