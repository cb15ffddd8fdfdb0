// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Node engine: the single entry point handlers call.
//!
//! Owns the journal store, the ledger client, the signing-session handle and
//! the advisor, and wires them into the completion coordinator per request.

use std::sync::Arc;
use std::time::Instant;

use taskanchor_core::coordinator::{CompletionCoordinator, CompletionOutcome};
use taskanchor_core::error::CompletionError;
use taskanchor_core::fingerprint::Fingerprint;
use taskanchor_core::ledger::{CompletionLedger, CompletionReceipt};
use taskanchor_core::session::SessionSnapshot;
use taskanchor_core::store::TaskStore;
use taskanchor_core::task::{Task, TaskId, TaskPatch, TaskStatus};

use crate::advisor::{AdvisorClient, AdvisorError, AdvisorReport};
use crate::api::CreateTaskRequest;
use crate::auth::{self, AuthUser};
use crate::errors::ApiError;
use crate::session::{SessionEvent, SessionHandle};
use crate::store::JournalStore;
use crate::users::{UserError, UserRecord};

pub struct Engine {
    pub store: Arc<JournalStore>,
    pub ledger: Arc<dyn CompletionLedger>,
    pub sessions: SessionHandle,
    pub advisor: AdvisorClient,
}

impl Engine {
    pub fn new(
        store: Arc<JournalStore>,
        ledger: Arc<dyn CompletionLedger>,
        sessions: SessionHandle,
        advisor: AdvisorClient,
    ) -> Self {
        Self { store, ledger, sessions, advisor }
    }

    // ---- users ----

    pub async fn signup(&self, full_name: &str, email: &str, password: &str) -> Result<UserRecord, UserError> {
        if full_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(UserError::MissingFields);
        }
        let salt = auth::generate_salt();
        let hash = auth::hash_password(&salt, password);
        let user = UserRecord::new(full_name.to_string(), email.to_string(), salt, hash);
        self.store.create_user(user).await
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<UserRecord, UserError> {
        let user = self.store.user_by_email(email).await.ok_or(UserError::BadCredentials)?;
        if !auth::verify_password(&user, password) {
            return Err(UserError::BadCredentials);
        }
        Ok(user)
    }

    // ---- plain task CRUD ----

    pub async fn create_task(&self, user: &AuthUser, req: CreateTaskRequest) -> Result<Task, ApiError> {
        let status = req.status.unwrap_or(TaskStatus::Pending);
        if status == TaskStatus::Completed {
            return Err(ApiError::InvalidInput(
                "tasks cannot be created completed; anchor a completion instead".to_string(),
            ));
        }
        if req.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("title is required".to_string()));
        }
        let task = Task::new(req.title, req.description, req.due, status, user.owner_id());
        Ok(self.store.create(task).await?)
    }

    pub async fn list_tasks(&self, user: &AuthUser) -> Result<Vec<Task>, ApiError> {
        Ok(self.store.list(&user.owner_id()).await?)
    }

    pub async fn get_task(&self, user: &AuthUser, id: TaskId) -> Result<Task, ApiError> {
        Ok(self.store.get(&user.owner_id(), id).await?)
    }

    pub async fn update_task(&self, user: &AuthUser, id: TaskId, patch: TaskPatch) -> Result<Task, ApiError> {
        Ok(self.store.update(&user.owner_id(), id, patch).await?)
    }

    pub async fn delete_task(&self, user: &AuthUser, id: TaskId) -> Result<(), ApiError> {
        Ok(self.store.delete(&user.owner_id(), id).await?)
    }

    // ---- completion anchoring ----

    pub async fn complete_task(&self, user: &AuthUser, id: TaskId) -> Result<CompletionOutcome, CompletionError> {
        let started = Instant::now();
        let coordinator = CompletionCoordinator::new(&*self.ledger, &*self.store, user);
        let result = coordinator.run(id).await;

        metrics::histogram!("taskanchor_completion_duration_seconds", started.elapsed().as_secs_f64());
        metrics::counter!("taskanchor_completions_total", 1, "outcome" => outcome_label(&result));
        match &result {
            Ok(_) => {
                metrics::counter!("taskanchor_ledger_appends_total", 1);
            }
            Err(CompletionError::PersistAfterLedgerSuccess { .. }) => {
                // The append itself was confirmed; only the reconciliation lags.
                metrics::counter!("taskanchor_ledger_appends_total", 1);
                metrics::counter!("taskanchor_persist_divergence_total", 1);
            }
            Err(_) => {}
        }
        result
    }

    pub async fn resume_persist(
        &self,
        user: &AuthUser,
        id: TaskId,
        fingerprint: Fingerprint,
        receipt: CompletionReceipt,
    ) -> Result<CompletionOutcome, CompletionError> {
        let coordinator = CompletionCoordinator::new(&*self.ledger, &*self.store, user);
        let result = coordinator.resume_persist(id, fingerprint, receipt).await;
        if result.is_ok() {
            metrics::counter!("taskanchor_completions_total", 1, "outcome" => "persisted_on_retry");
        }
        result
    }

    // ---- signing session ----

    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.sessions.snapshot()
    }

    pub fn apply_session_event(&self, event: SessionEvent) -> SessionSnapshot {
        self.sessions.apply(event)
    }

    // ---- advisor ----

    pub async fn analyze_priorities(
        &self,
        user: &AuthUser,
        preferences: &serde_json::Value,
    ) -> Result<AdvisorReport, ApiError> {
        let tasks = self.list_tasks(user).await?;
        Ok(self.advisor.analyze_priorities(&tasks, preferences).await?)
    }

    pub async fn suggest_reminders(
        &self,
        user: &AuthUser,
        task_id: TaskId,
        preferences: &serde_json::Value,
    ) -> Result<AdvisorReport, ApiError> {
        let task = self.get_task(user, task_id).await?;
        self.advisor.suggest_reminders(&task, preferences).await.map_err(AdvisorError::into)
    }
}

fn outcome_label(result: &Result<CompletionOutcome, CompletionError>) -> &'static str {
    match result {
        Ok(_) => "persisted",
        Err(CompletionError::Unauthorized) => "unauthorized",
        Err(CompletionError::NotFound) => "not_found",
        Err(CompletionError::SessionNotReady) => "session_not_ready",
        Err(CompletionError::UnsupportedNetwork(_)) => "unsupported_network",
        Err(CompletionError::SessionChanged) => "session_changed",
        Err(CompletionError::WriteRejectedByUser) => "write_rejected",
        Err(CompletionError::AlreadyCompleted { .. }) => "already_completed",
        Err(CompletionError::LedgerUnavailable(_)) => "ledger_unavailable",
        Err(CompletionError::Conflict) => "conflict",
        Err(CompletionError::StoreUnavailable(_)) => "store_unavailable",
        Err(CompletionError::PersistAfterLedgerSuccess { .. }) => "persist_divergence",
    }
}
