// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Signing-session state and the supported-network table.
//!
//! The signer/network pairing is managed outside this system (a wallet or
//! signing service) and can change at any time. The coordinator never holds a
//! live handle; it takes point-in-time `SessionSnapshot`s and compares epochs
//! to detect a swap mid-flight.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Ledger-side identity of the signer (an account address, hex form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerAddress(pub String);

impl std::fmt::Display for SignerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time view of the signing session. `epoch` increments on every
/// externally driven change (signer attached/detached, network switched), so
/// two snapshots with equal epochs describe the same session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub signer: Option<SignerAddress>,
    pub chain: Option<ChainId>,
    pub epoch: u64,
}

impl SessionSnapshot {
    pub fn detached() -> Self {
        Self { signer: None, chain: None, epoch: 0 }
    }

    /// Ready means: a signer is attached and the chain is one we recognize.
    pub fn is_ready(&self) -> bool {
        self.signer.is_some() && self.chain.is_some_and(|c| network_info(c).is_some())
    }
}

/// Static description of a ledger network the node will write to.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub chain_id: ChainId,
    pub name: &'static str,
    pub currency_symbol: &'static str,
    pub explorer_url: &'static str,
}

/// Supported networks, keyed by chain id. A static table, deliberately not
/// runtime-extensible: adding a network is a code change and a review.
pub const SUPPORTED_NETWORKS: &[NetworkInfo] = &[NetworkInfo {
    chain_id: ChainId(11_155_111),
    name: "Sepolia Test Network",
    currency_symbol: "ETH",
    explorer_url: "https://sepolia.etherscan.io",
}];

pub const DEFAULT_NETWORK: ChainId = ChainId(11_155_111);

pub fn network_info(chain: ChainId) -> Option<&'static NetworkInfo> {
    SUPPORTED_NETWORKS.iter().find(|n| n.chain_id == chain)
}
