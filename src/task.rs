// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Task records and the snapshot the fingerprint is derived from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fingerprint::Fingerprint;
use crate::ledger::CompletionReceipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Authenticated owner identity. Included in the fingerprint tuple, so two
/// owners completing byte-identical tasks anchor different fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Wire encoding, also the byte form hashed into the fingerprint.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due: DateTime<Utc>,
    pub status: TaskStatus,
    pub owner: OwnerId,
    /// Set exactly once, when the completion is reconciled into the store.
    pub fingerprint: Option<Fingerprint>,
    /// Proof of the ledger append; lives and dies with the task.
    pub receipt: Option<CompletionReceipt>,
    /// Optimistic concurrency token; bumped on every store write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: String, description: String, due: DateTime<Utc>, status: TaskStatus, owner: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            title,
            description,
            due,
            status,
            owner,
            fingerprint: None,
            receipt: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The field values that will be persisted as "completed", captured at a
    /// single point. The fingerprint must be derived from this snapshot and
    /// nothing else: deriving from the live record again after an edit would
    /// silently produce a different digest and break the ledger linkage.
    pub fn completion_snapshot(&self) -> CompletionSnapshot {
        CompletionSnapshot {
            title: self.title.clone(),
            description: self.description.clone(),
            status: TaskStatus::Completed,
            due: self.due,
        }
    }

    /// Apply a direct field edit. Terminal tasks are frozen, and completion
    /// cannot be reached through this path (that is the coordinator's job).
    pub fn apply_patch(&mut self, patch: TaskPatch) -> Result<(), PatchRejected> {
        if self.status.is_terminal() {
            return Err(PatchRejected::TaskIsCompleted);
        }
        if patch.status == Some(TaskStatus::Completed) {
            return Err(PatchRejected::CompletionNotPatchable);
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due) = patch.due {
            self.due = due;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Fingerprint input tuple. Field order is fixed; changing the shape is a
/// breaking change that requires migrating previously anchored fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSnapshot {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due: DateTime<Utc>,
}

/// Partial update for the plain-CRUD path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PatchRejected {
    #[error("completed tasks cannot be edited")]
    TaskIsCompleted,
    #[error("completion must go through the anchoring flow, not a field edit")]
    CompletionNotPatchable,
}
