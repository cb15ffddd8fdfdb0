// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Failure taxonomy for the completion flow.
//!
//! Every variant is a distinct, user-presentable outcome. The one that must
//! never be swallowed is `PersistAfterLedgerSuccess`: the ledger already
//! attributes the completion to this identity but the store does not reflect
//! it yet, so the variant carries everything needed to retry the store write
//! alone (never the ledger write).

use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::identity::IdentityError;
use crate::ledger::{CompletionReceipt, LedgerError};
use crate::session::{ChainId, SignerAddress};
use crate::store::StoreError;

/// What the caller should do after a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// Terminal for this attempt; retrying will not change the outcome.
    NoRetry,
    /// Transient; rerun the whole flow from fingerprint derivation.
    RetryFlow,
    /// The ledger write is confirmed; retry only the store update, with the
    /// fingerprint and receipt already obtained.
    RetryPersistOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("no authenticated identity")]
    Unauthorized,

    #[error("task not found")]
    NotFound,

    #[error("no signing session attached")]
    SessionNotReady,

    #[error("network {0} is not supported")]
    UnsupportedNetwork(ChainId),

    #[error("signing session changed during the completion; restart it")]
    SessionChanged,

    #[error("signer declined the completion write")]
    WriteRejectedByUser,

    #[error("completion is already recorded on the ledger")]
    AlreadyCompleted { completer: Option<SignerAddress> },

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("task was modified or removed concurrently")]
    Conflict,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("ledger write confirmed but the store update failed: {reason}")]
    PersistAfterLedgerSuccess {
        fingerprint: Fingerprint,
        receipt: CompletionReceipt,
        reason: String,
    },
}

impl CompletionError {
    pub fn retry_hint(&self) -> RetryHint {
        match self {
            CompletionError::LedgerUnavailable(_)
            | CompletionError::StoreUnavailable(_)
            | CompletionError::SessionChanged => RetryHint::RetryFlow,
            CompletionError::PersistAfterLedgerSuccess { .. } => RetryHint::RetryPersistOnly,
            _ => RetryHint::NoRetry,
        }
    }
}

impl From<IdentityError> for CompletionError {
    fn from(_: IdentityError) -> Self {
        CompletionError::Unauthorized
    }
}

impl From<LedgerError> for CompletionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SessionNotReady => CompletionError::SessionNotReady,
            LedgerError::UnsupportedNetwork { chain } => CompletionError::UnsupportedNetwork(chain),
            LedgerError::WriteRejectedByUser => CompletionError::WriteRejectedByUser,
            LedgerError::AlreadyCompleted { completer } => CompletionError::AlreadyCompleted { completer },
            LedgerError::Unavailable(msg) => CompletionError::LedgerUnavailable(msg),
        }
    }
}

/// For loads and edits outside the reconciliation write. The persist step has
/// its own mapping in the coordinator, because its failures are not ordinary
/// store failures once the ledger write is confirmed.
impl From<StoreError> for CompletionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CompletionError::NotFound,
            StoreError::Conflict => CompletionError::Conflict,
            StoreError::InvalidPatch(msg) => CompletionError::StoreUnavailable(msg),
            StoreError::Unavailable(msg) => CompletionError::StoreUnavailable(msg),
        }
    }
}
