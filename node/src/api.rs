// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskanchor_core::fingerprint::Fingerprint;
use taskanchor_core::ledger::CompletionReceipt;
use taskanchor_core::task::{Task, TaskId, TaskPatch, TaskStatus};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub due: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

pub type UpdateTaskRequest = TaskPatch;

#[derive(Serialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due: DateTime<Utc>,
    pub status: TaskStatus,
    pub fingerprint: Option<Fingerprint>,
    pub receipt: Option<CompletionReceipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due: task.due,
            status: task.status,
            fingerprint: task.fingerprint,
            receipt: task.receipt,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct CompleteTaskResponse {
    pub task: TaskResponse,
    pub fingerprint: Fingerprint,
    pub receipt: CompletionReceipt,
}

/// Store-only retry after a reported divergence; the fingerprint and receipt
/// come verbatim from the failed attempt's error body.
#[derive(Deserialize)]
pub struct ResumePersistRequest {
    pub fingerprint: Fingerprint,
    pub receipt: CompletionReceipt,
}

#[derive(Deserialize)]
pub struct AnalyzePrioritiesRequest {
    #[serde(default)]
    pub preferences: serde_json::Value,
}

#[derive(Deserialize)]
pub struct SuggestRemindersRequest {
    pub task_id: TaskId,
    #[serde(default)]
    pub preferences: serde_json::Value,
}
