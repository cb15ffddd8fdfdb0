// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Capability trait over the external append-only ledger.
//!
//! The ledger is a write-once oracle: one record per fingerprint, globally
//! visible, never rolled back. Whether "already written" is detected by the
//! pre-write query or as a write-time rejection, callers see the same
//! `LedgerError::AlreadyCompleted`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::session::{ChainId, SessionSnapshot, SignerAddress};

/// Opaque proof of a successful append. Created at write confirmation,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    /// Ledger write identifier (transaction id).
    pub tx_id: String,
    /// Block the write was ordered into, when the gateway reports it.
    pub block: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("no signing session attached")]
    SessionNotReady,

    #[error("network {chain} is not supported")]
    UnsupportedNetwork { chain: ChainId },

    #[error("signer declined the completion write")]
    WriteRejectedByUser,

    #[error("ledger already holds a completion for this fingerprint")]
    AlreadyCompleted { completer: Option<SignerAddress> },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// The two read/write primitives the system assumes, plus session
/// introspection. Implementations must not retry an append blindly after an
/// ambiguous outcome (timeout after submission); the record may have landed,
/// and only a fresh `query_completion` can tell.
#[async_trait]
pub trait CompletionLedger: Send + Sync {
    /// Current signer/network pairing. Cheap; called before and during every
    /// coordinator run to detect externally driven session changes.
    fn session(&self) -> SessionSnapshot;

    /// Read-only lookup. `None` means the ledger holds no record for the
    /// fingerprint. Never mutates state.
    async fn query_completion(&self, fingerprint: &Fingerprint) -> Result<Option<SignerAddress>, LedgerError>;

    /// Request a ledger write attributing the fingerprint to the current
    /// signing identity. Irreversible and globally observable on success.
    async fn append_completion(&self, fingerprint: &Fingerprint) -> Result<CompletionReceipt, LedgerError>;
}
