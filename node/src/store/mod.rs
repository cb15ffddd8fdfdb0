// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Journal-backed task and user store.
//!
//! In-memory maps are the serving state; the journal is the truth. Every
//! mutation follows the same protocol as the rest of the node: validate
//! against current state, append to the journal (fsync), then apply to
//! memory. A crash between append and apply is repaired by replay.

pub mod journal;

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;

use taskanchor_core::fingerprint::Fingerprint;
use taskanchor_core::ledger::CompletionReceipt;
use taskanchor_core::store::{StoreError, TaskStore};
use taskanchor_core::task::{OwnerId, Task, TaskId, TaskPatch, TaskStatus};

use crate::users::{UserError, UserRecord};
use journal::{JournalRecord, JournalWriter};

struct StoreInner {
    tasks: HashMap<TaskId, Task>,
    users: HashMap<uuid::Uuid, UserRecord>,
    emails: HashMap<String, uuid::Uuid>,
    writer: JournalWriter,
}

impl StoreInner {
    fn owned_task(&self, owner: &OwnerId, id: TaskId) -> Result<&Task, StoreError> {
        match self.tasks.get(&id) {
            Some(task) if &task.owner == owner => Ok(task),
            _ => Err(StoreError::NotFound),
        }
    }

    fn append(&mut self, record: &JournalRecord) -> Result<(), StoreError> {
        self.writer.append(record).map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn apply(&mut self, record: JournalRecord) {
        match record {
            JournalRecord::Header { .. } => {}
            JournalRecord::UserCreated { user } => {
                self.emails.insert(user.email.clone(), user.id);
                self.users.insert(user.id, user);
            }
            JournalRecord::TaskCreated { task }
            | JournalRecord::TaskEdited { task }
            | JournalRecord::TaskCompleted { task } => {
                self.tasks.insert(task.id, task);
            }
            JournalRecord::TaskDeleted { id, .. } => {
                self.tasks.remove(&id);
            }
        }
    }
}

pub struct JournalStore {
    inner: Mutex<StoreInner>,
}

impl JournalStore {
    /// Open the journal and replay it into serving state. A torn final
    /// record (crash mid-append) never became truth; it is truncated away so
    /// appends continue from the clean prefix.
    pub fn open(path: &Path) -> Result<Self, journal::JournalError> {
        let records = if path.exists() {
            let replayed = journal::replay(path)?;
            let file_len = std::fs::metadata(path)?.len();
            if replayed.valid_len < file_len {
                tracing::warn!(file_len, valid_len = replayed.valid_len, "truncating torn journal tail");
                let file = std::fs::OpenOptions::new().write(true).open(path)?;
                file.set_len(replayed.valid_len)?;
                file.sync_all()?;
            }
            replayed.records
        } else {
            Vec::new()
        };
        let writer = JournalWriter::open(path)?;
        let mut inner = StoreInner {
            tasks: HashMap::new(),
            users: HashMap::new(),
            emails: HashMap::new(),
            writer,
        };
        let replayed = records.len();
        for record in records {
            inner.apply(record);
        }
        tracing::info!(replayed, tasks = inner.tasks.len(), users = inner.users.len(), "journal replayed");
        Ok(Self { inner: Mutex::new(inner) })
    }

    pub async fn create_user(&self, user: UserRecord) -> Result<UserRecord, UserError> {
        let mut inner = self.inner.lock().await;
        if inner.emails.contains_key(&user.email) {
            return Err(UserError::EmailTaken);
        }
        inner
            .append(&JournalRecord::UserCreated { user: user.clone() })
            .map_err(|e| UserError::Store(e.to_string()))?;
        inner.apply(JournalRecord::UserCreated { user: user.clone() });
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        let inner = self.inner.lock().await;
        let id = inner.emails.get(email)?;
        inner.users.get(id).cloned()
    }

    pub async fn user_by_id(&self, id: uuid::Uuid) -> Option<UserRecord> {
        self.inner.lock().await.users.get(&id).cloned()
    }
}

#[async_trait]
impl TaskStore for JournalStore {
    async fn create(&self, task: Task) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.append(&JournalRecord::TaskCreated { task: task.clone() })?;
        inner.apply(JournalRecord::TaskCreated { task: task.clone() });
        Ok(task)
    }

    async fn get(&self, owner: &OwnerId, id: TaskId) -> Result<Task, StoreError> {
        let inner = self.inner.lock().await;
        inner.owned_task(owner, id).cloned()
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<Task> = inner.tasks.values().filter(|t| &t.owner == owner).cloned().collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    async fn update(&self, owner: &OwnerId, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut task = inner.owned_task(owner, id)?.clone();
        task.apply_patch(patch).map_err(|e| StoreError::InvalidPatch(e.to_string()))?;
        task.version += 1;
        inner.append(&JournalRecord::TaskEdited { task: task.clone() })?;
        inner.apply(JournalRecord::TaskEdited { task: task.clone() });
        Ok(task)
    }

    async fn delete(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.owned_task(owner, id)?;
        inner.append(&JournalRecord::TaskDeleted { owner: owner.clone(), id })?;
        inner.apply(JournalRecord::TaskDeleted { owner: owner.clone(), id });
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
        let mut inner = self.inner.lock().await;
        // A deleted or reassigned task is a conflict here, not a plain miss:
        // the caller loaded it moments ago.
        let mut task = inner.owned_task(owner, id).map_err(|_| StoreError::Conflict)?.clone();
        if task.version != expected_version {
            return Err(StoreError::Conflict);
        }
        task.status = TaskStatus::Completed;
        task.fingerprint = Some(fingerprint);
        task.receipt = Some(receipt);
        task.version += 1;
        task.updated_at = chrono::Utc::now();
        inner.append(&JournalRecord::TaskCompleted { task: task.clone() })?;
        inner.apply(JournalRecord::TaskCompleted { task: task.clone() });
        Ok(task)
    }
}
