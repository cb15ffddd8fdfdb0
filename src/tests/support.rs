// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! In-memory ledger/store doubles for coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::fingerprint::Fingerprint;
use crate::identity::{IdentityError, IdentityProvider};
use crate::ledger::{CompletionLedger, CompletionReceipt, LedgerError};
use crate::session::{ChainId, SessionSnapshot, SignerAddress};
use crate::store::{StoreError, TaskStore};
use crate::task::{OwnerId, Task, TaskId, TaskPatch, TaskStatus};

pub fn sample_task(owner: &OwnerId) -> Task {
    Task::new(
        "A".to_string(),
        "d".to_string(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        TaskStatus::Pending,
        owner.clone(),
    )
}

pub struct FixedIdentity(pub OwnerId);

impl IdentityProvider for FixedIdentity {
    fn current_owner(&self) -> Result<OwnerId, IdentityError> {
        Ok(self.0.clone())
    }
}

pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_owner(&self) -> Result<OwnerId, IdentityError> {
        Err(IdentityError::Unauthorized)
    }
}

/// Write-once ledger double. Counts calls so tests can assert that a flow
/// made no second write attempt.
pub struct MockLedger {
    records: Mutex<HashMap<[u8; 32], SignerAddress>>,
    signer: Mutex<Option<SignerAddress>>,
    chain: Mutex<Option<ChainId>>,
    epoch: AtomicU64,
    pub queries: AtomicU64,
    pub appends: AtomicU64,
    pub reject_writes: AtomicBool,
    pub unavailable: AtomicBool,
}

impl MockLedger {
    pub fn ready() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            signer: Mutex::new(Some(SignerAddress("0xabc0".to_string()))),
            chain: Mutex::new(Some(crate::session::DEFAULT_NETWORK)),
            epoch: AtomicU64::new(1),
            queries: AtomicU64::new(0),
            appends: AtomicU64::new(0),
            reject_writes: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn detached() -> Self {
        let ledger = Self::ready();
        *ledger.signer.lock().unwrap() = None;
        *ledger.chain.lock().unwrap() = None;
        ledger
    }

    pub fn switch_chain(&self, chain: ChainId) {
        *self.chain.lock().unwrap() = Some(chain);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub fn preload(&self, fingerprint: &Fingerprint, completer: SignerAddress) {
        self.records.lock().unwrap().insert(*fingerprint.as_bytes(), completer);
    }
}

#[async_trait]
impl CompletionLedger for MockLedger {
    fn session(&self) -> SessionSnapshot {
        SessionSnapshot {
            signer: self.signer.lock().unwrap().clone(),
            chain: *self.chain.lock().unwrap(),
            epoch: self.epoch.load(Ordering::SeqCst),
        }
    }

    async fn query_completion(&self, fingerprint: &Fingerprint) -> Result<Option<SignerAddress>, LedgerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("node timeout".to_string()));
        }
        Ok(self.records.lock().unwrap().get(fingerprint.as_bytes()).cloned())
    }

    async fn append_completion(&self, fingerprint: &Fingerprint) -> Result<CompletionReceipt, LedgerError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("node timeout".to_string()));
        }
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::WriteRejectedByUser);
        }
        let signer = self
            .signer
            .lock()
            .unwrap()
            .clone()
            .ok_or(LedgerError::SessionNotReady)?;

        let mut records = self.records.lock().unwrap();
        if let Some(completer) = records.get(fingerprint.as_bytes()) {
            return Err(LedgerError::AlreadyCompleted { completer: Some(completer.clone()) });
        }
        records.insert(*fingerprint.as_bytes(), signer);
        let height = records.len() as u64;
        Ok(CompletionReceipt { tx_id: format!("0xtx{height:04}"), block: Some(height) })
    }
}

/// In-memory store with the same optimistic-versioning behavior the journal
/// store has. `fail_persist` simulates an outage of the reconciliation write
/// only, after the ledger already confirmed.
pub struct MemoryStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    pub fail_persist: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { tasks: Mutex::new(HashMap::new()), fail_persist: AtomicBool::new(false) }
    }

    fn owned(task: Option<&Task>, owner: &OwnerId) -> Result<Task, StoreError> {
        match task {
            Some(task) if &task.owner == owner => Ok(task.clone()),
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, task: Task) -> Result<Task, StoreError> {
        self.tasks.lock().unwrap().insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, owner: &OwnerId, id: TaskId) -> Result<Task, StoreError> {
        let tasks = self.tasks.lock().unwrap();
        Self::owned(tasks.get(&id), owner)
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.values().filter(|t| &t.owner == owner).cloned().collect())
    }

    async fn update(&self, owner: &OwnerId, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let mut task = Self::owned(tasks.get(&id), owner)?;
        task.apply_patch(patch).map_err(|e| StoreError::InvalidPatch(e.to_string()))?;
        task.version += 1;
        tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn delete(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        Self::owned(tasks.get(&id), owner)?;
        tasks.remove(&id);
        Ok(())
    }

    async fn persist_completion(
        &self,
        owner: &OwnerId,
        id: TaskId,
        expected_version: u64,
        fingerprint: Fingerprint,
        receipt: CompletionReceipt,
    ) -> Result<Task, StoreError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        let mut tasks = self.tasks.lock().unwrap();
        let mut task = Self::owned(tasks.get(&id), owner).map_err(|_| StoreError::Conflict)?;
        if task.version != expected_version {
            return Err(StoreError::Conflict);
        }
        task.status = TaskStatus::Completed;
        task.fingerprint = Some(fingerprint);
        task.receipt = Some(receipt);
        task.version += 1;
        task.updated_at = chrono::Utc::now();
        tasks.insert(id, task.clone());
        Ok(task)
    }
}
