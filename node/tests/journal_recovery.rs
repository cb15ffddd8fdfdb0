// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use taskanchor_core::fingerprint::Fingerprint;
use taskanchor_core::ledger::CompletionReceipt;
use taskanchor_core::store::{StoreError, TaskStore};
use taskanchor_core::task::{OwnerId, Task, TaskPatch, TaskStatus};
use taskanchor_node::store::JournalStore;
use taskanchor_node::users::UserRecord;

fn owner() -> OwnerId {
    OwnerId("u1".to_string())
}

fn sample_task() -> Task {
    Task::new(
        "A".to_string(),
        "d".to_string(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        TaskStatus::Pending,
        owner(),
    )
}

#[tokio::test]
async fn restart_replays_tasks_users_and_completions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.journal");

    let task_id;
    {
        let store = JournalStore::open(&path).unwrap();
        store
            .create_user(UserRecord::new(
                "Test User".to_string(),
                "u1@example.com".to_string(),
                "salt".to_string(),
                "hash".to_string(),
            ))
            .await
            .unwrap();

        let task = store.create(sample_task()).await.unwrap();
        task_id = task.id;
        store
            .update(&owner(), task_id, TaskPatch { title: Some("B".to_string()), ..TaskPatch::default() })
            .await
            .unwrap();

        let fingerprint = Fingerprint::derive(&task.completion_snapshot(), &owner());
        store
            .persist_completion(
                &owner(),
                task_id,
                1,
                fingerprint,
                CompletionReceipt { tx_id: "0xtx0001".to_string(), block: Some(1) },
            )
            .await
            .unwrap();
    }

    // Fresh process: everything must come back from the journal alone.
    let store = JournalStore::open(&path).unwrap();
    let task = store.get(&owner(), task_id).await.unwrap();
    assert_eq!(task.title, "B");
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.fingerprint.is_some());
    assert_eq!(task.receipt.as_ref().unwrap().tx_id, "0xtx0001");
    assert_eq!(task.version, 2);
    assert!(store.user_by_email("u1@example.com").await.is_some());
}

#[tokio::test]
async fn torn_final_record_is_dropped_on_replay() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.journal");

    {
        let store = JournalStore::open(&path).unwrap();
        store.create(sample_task()).await.unwrap();
    }

    // Simulate a crash mid-append: half a record, no trailing newline.
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"kind\":\"task_created\",\"task\":{\"id\":\"trunc").unwrap();
    }

    let store = JournalStore::open(&path).unwrap();
    assert_eq!(store.list(&owner()).await.unwrap().len(), 1);

    // The torn tail was truncated, so appending and replaying again is clean.
    store.create(sample_task()).await.unwrap();
    drop(store);
    let store = JournalStore::open(&path).unwrap();
    assert_eq!(store.list(&owner()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn stale_version_conflicts_instead_of_overwriting() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.journal");
    let store = JournalStore::open(&path).unwrap();

    let task = store.create(sample_task()).await.unwrap();
    // A rival edit bumps the version after our snapshot.
    store
        .update(&owner(), task.id, TaskPatch { title: Some("B".to_string()), ..TaskPatch::default() })
        .await
        .unwrap();

    let fingerprint = Fingerprint::derive(&task.completion_snapshot(), &owner());
    let err = store
        .persist_completion(
            &owner(),
            task.id,
            task.version,
            fingerprint,
            CompletionReceipt { tx_id: "0xtx0001".to_string(), block: Some(1) },
        )
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Conflict);

    // The record kept its edited, uncompleted state.
    let task = store.get(&owner(), task.id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.fingerprint.is_none());
}

#[tokio::test]
async fn deleted_task_conflicts_on_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.journal");
    let store = JournalStore::open(&path).unwrap();

    let task = store.create(sample_task()).await.unwrap();
    let fingerprint = Fingerprint::derive(&task.completion_snapshot(), &owner());
    store.delete(&owner(), task.id).await.unwrap();

    let err = store
        .persist_completion(
            &owner(),
            task.id,
            task.version,
            fingerprint,
            CompletionReceipt { tx_id: "0xtx0001".to_string(), block: Some(1) },
        )
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Conflict);
}
