// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Contract for the durable task store.
//!
//! The store is the system of record for mutable task state, scoped by owner.
//! Updates are optimistic: a write against a task that was deleted, reassigned
//! or concurrently modified fails with `Conflict` instead of silently
//! overwriting.

use async_trait::async_trait;
use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::ledger::CompletionReceipt;
use crate::task::{OwnerId, Task, TaskId, TaskPatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task not found")]
    NotFound,

    #[error("task was modified or removed concurrently")]
    Conflict,

    #[error("field edit rejected: {0}")]
    InvalidPatch(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task, StoreError>;

    async fn get(&self, owner: &OwnerId, id: TaskId) -> Result<Task, StoreError>;

    async fn list(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError>;

    /// Direct field edit path. Terminal tasks are frozen and completion is
    /// unreachable from here; those rules live on `Task::apply_patch`.
    async fn update(&self, owner: &OwnerId, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError>;

    async fn delete(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError>;

    /// The single reconciliation write: status=completed, fingerprint and
    /// receipt land together or not at all. `expected_version` is the version
    /// the coordinator loaded; any drift since then is a `Conflict`.
    async fn persist_completion(
        &self,
        owner: &OwnerId,
        id: TaskId,
        expected_version: u64,
        fingerprint: Fingerprint,
        receipt: CompletionReceipt,
    ) -> Result<Task, StoreError>;
}
