// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Completion coordinator - the reconciliation barrier.
//!
//! Drives one completion attempt across two failure domains that cannot be
//! committed atomically: the append-only ledger (irreversible) and the
//! mutable task store (transactional). The step order is fixed:
//!
//! ```text
//! Idle
//! ↓  derive fingerprint (no external calls)
//! FingerprintComputed
//! ↓  query ledger; existing record → AlreadyCompleted
//! LedgerChecked
//! ↓  re-validate session, then append
//! Writing
//! ↓  append confirmed
//! Confirmed
//! ↓  single store update {status, fingerprint, receipt}
//! Persisted
//! ```
//!
//! # Invariants
//! - fingerprint before query, query before write, confirmation before persist
//! - one fingerprint derivation per run, from the values being persisted
//! - ledger races resolve first-ledger-writer-wins, never first-local-request
//! - a store failure after ledger confirmation is reported, never hidden

use crate::error::CompletionError;
use crate::fingerprint::Fingerprint;
use crate::identity::IdentityProvider;
use crate::ledger::{CompletionLedger, CompletionReceipt, LedgerError};
use crate::session::SessionSnapshot;
use crate::store::TaskStore;
use crate::task::{Task, TaskId};

/// Progress marker for one run. Reported in traces; `Failed` is the error
/// return itself, carrying the retry hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhase {
    Idle,
    FingerprintComputed,
    LedgerChecked,
    Writing,
    Confirmed,
    Persisted,
}

/// Terminal success: the store row now carries the completed status, the
/// fingerprint and the ledger receipt.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub task: Task,
    pub fingerprint: Fingerprint,
    pub receipt: CompletionReceipt,
}

pub struct CompletionCoordinator<'a, L: ?Sized, S: ?Sized, I: ?Sized> {
    ledger: &'a L,
    store: &'a S,
    identity: &'a I,
}

impl<'a, L, S, I> CompletionCoordinator<'a, L, S, I>
where
    L: CompletionLedger + ?Sized,
    S: TaskStore + ?Sized,
    I: IdentityProvider + ?Sized,
{
    pub fn new(ledger: &'a L, store: &'a S, identity: &'a I) -> Self {
        Self { ledger, store, identity }
    }

    /// Run the full flow for one task. Each run is an independent state
    /// machine instance; steps are strictly sequential, suspended only on the
    /// ledger/store calls.
    pub async fn run(&self, task_id: TaskId) -> Result<CompletionOutcome, CompletionError> {
        let mut phase = CompletionPhase::Idle;

        // Identity is consumed once, before any external call. If the signer
        // identity changes later, the epoch guard below catches it.
        let owner = self.identity.current_owner()?;
        let session = self.ledger.session();

        let task = self.store.get(&owner, task_id).await?;

        // Idempotence: a task the store already shows completed short-circuits
        // before fingerprint derivation. Deriving again from since-edited
        // fields could produce a digest the ledger has never seen. The store
        // does not record who completed, so no completer is attributed here.
        if task.status.is_terminal() {
            return Err(CompletionError::AlreadyCompleted { completer: None });
        }

        // Step 1: derive the fingerprint from the exact values that will be
        // persisted. This is the only derivation in the run.
        let fingerprint = Fingerprint::derive(&task.completion_snapshot(), &owner);
        phase = self.advance(phase, CompletionPhase::FingerprintComputed, &fingerprint);

        // Step 2: query the ledger. An existing record means another identity
        // (or a prior attempt of ours) won the race; the local record must not
        // be marked completed.
        self.guard_session(&session)?;
        if let Some(completer) = self.ledger.query_completion(&fingerprint).await? {
            tracing::info!(%fingerprint, %completer, "ledger already holds this completion");
            return Err(CompletionError::AlreadyCompleted { completer: Some(completer) });
        }
        phase = self.advance(phase, CompletionPhase::LedgerChecked, &fingerprint);

        // Step 3: the write. Session readiness is re-validated immediately
        // before it; the signing environment is externally mutable and may
        // have changed since the query.
        let current = self.ledger.session();
        if current.epoch != session.epoch {
            tracing::warn!(started = session.epoch, now = current.epoch, "session changed mid-flight, aborting");
            return Err(CompletionError::SessionChanged);
        }
        self.session_ready(&current)?;
        phase = self.advance(phase, CompletionPhase::Writing, &fingerprint);

        let receipt = match self.ledger.append_completion(&fingerprint).await {
            Ok(receipt) => receipt,
            // A write-time rejection is the same outcome as a pre-write hit.
            Err(LedgerError::AlreadyCompleted { completer }) => {
                return Err(CompletionError::AlreadyCompleted { completer });
            }
            Err(err) => return Err(err.into()),
        };
        phase = self.advance(phase, CompletionPhase::Confirmed, &fingerprint);

        // Step 4: reconcile into the store. From here the ledger write is
        // irreversible truth; a store failure leaves a known inconsistency
        // that must be retried against the store alone.
        match self
            .store
            .persist_completion(&owner, task_id, task.version, fingerprint, receipt.clone())
            .await
        {
            Ok(task) => {
                self.advance(phase, CompletionPhase::Persisted, &fingerprint);
                Ok(CompletionOutcome { task, fingerprint, receipt })
            }
            Err(err) => {
                tracing::error!(
                    %fingerprint,
                    tx_id = %receipt.tx_id,
                    error = %err,
                    "ledger write confirmed but store update failed; store lags the ledger"
                );
                Err(CompletionError::PersistAfterLedgerSuccess {
                    fingerprint,
                    receipt,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Store-only recovery after `PersistAfterLedgerSuccess`. Re-uses the
    /// fingerprint and receipt from the failed run; the ledger is never
    /// touched again for this completion.
    pub async fn resume_persist(
        &self,
        task_id: TaskId,
        fingerprint: Fingerprint,
        receipt: CompletionReceipt,
    ) -> Result<CompletionOutcome, CompletionError> {
        let owner = self.identity.current_owner()?;
        let task = self.store.get(&owner, task_id).await?;

        // The earlier retry may have landed after all.
        if task.status.is_terminal() {
            return Ok(CompletionOutcome { task, fingerprint, receipt });
        }

        match self
            .store
            .persist_completion(&owner, task_id, task.version, fingerprint, receipt.clone())
            .await
        {
            Ok(task) => Ok(CompletionOutcome { task, fingerprint, receipt }),
            Err(err) => Err(CompletionError::PersistAfterLedgerSuccess {
                fingerprint,
                receipt,
                reason: err.to_string(),
            }),
        }
    }

    fn advance(&self, from: CompletionPhase, to: CompletionPhase, fingerprint: &Fingerprint) -> CompletionPhase {
        tracing::debug!(?from, ?to, %fingerprint, "completion phase");
        to
    }

    fn guard_session(&self, session: &SessionSnapshot) -> Result<(), CompletionError> {
        let current = self.ledger.session();
        if current.epoch != session.epoch {
            return Err(CompletionError::SessionChanged);
        }
        Ok(())
    }

    fn session_ready(&self, session: &SessionSnapshot) -> Result<(), CompletionError> {
        if session.signer.is_none() {
            return Err(CompletionError::SessionNotReady);
        }
        match session.chain {
            None => Err(CompletionError::SessionNotReady),
            Some(chain) if !session.is_ready() => Err(CompletionError::UnsupportedNetwork(chain)),
            Some(_) => Ok(()),
        }
    }
}
