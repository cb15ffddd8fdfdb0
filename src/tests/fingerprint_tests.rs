// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use chrono::{TimeZone, Utc};

use crate::fingerprint::Fingerprint;
use crate::task::{CompletionSnapshot, OwnerId, TaskStatus};

fn snapshot() -> CompletionSnapshot {
    CompletionSnapshot {
        title: "A".to_string(),
        description: "d".to_string(),
        status: TaskStatus::Completed,
        due: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn derivation_is_deterministic() {
    let owner = OwnerId("u1".to_string());
    let a = Fingerprint::derive(&snapshot(), &owner);
    let b = Fingerprint::derive(&snapshot(), &owner);
    assert_eq!(a, b);
}

#[test]
fn every_tuple_field_changes_the_digest() {
    let owner = OwnerId("u1".to_string());
    let base = Fingerprint::derive(&snapshot(), &owner);

    let mut edited = snapshot();
    edited.title = "B".to_string();
    assert_ne!(base, Fingerprint::derive(&edited, &owner));

    let mut edited = snapshot();
    edited.description = "e".to_string();
    assert_ne!(base, Fingerprint::derive(&edited, &owner));

    let mut edited = snapshot();
    edited.status = TaskStatus::Pending;
    assert_ne!(base, Fingerprint::derive(&edited, &owner));

    let mut edited = snapshot();
    edited.due = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    assert_ne!(base, Fingerprint::derive(&edited, &owner));

    assert_ne!(base, Fingerprint::derive(&snapshot(), &OwnerId("u2".to_string())));
}

#[test]
fn field_boundaries_cannot_shift() {
    // Length prefixing: moving a character between adjacent fields must not
    // produce the same digest.
    let owner = OwnerId("u1".to_string());
    let mut left = snapshot();
    left.title = "ab".to_string();
    left.description = "c".to_string();
    let mut right = snapshot();
    right.title = "a".to_string();
    right.description = "bc".to_string();
    assert_ne!(Fingerprint::derive(&left, &owner), Fingerprint::derive(&right, &owner));
}

#[test]
fn hex_round_trip() {
    let owner = OwnerId("u1".to_string());
    let fp = Fingerprint::derive(&snapshot(), &owner);
    let hex = fp.to_hex();
    assert_eq!(hex.len(), 64);
    assert_eq!(Fingerprint::from_hex(&hex), Some(fp));
    assert_eq!(Fingerprint::from_hex("zz"), None);
}
