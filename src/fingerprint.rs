// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Deterministic completion fingerprints.
//!
//! A fingerprint is a 32-byte BLAKE3 digest over the ordered tuple
//! (title, description, status, due-millis, owner). Every variable-length
//! field is length-prefixed before hashing so field boundaries cannot shift,
//! and the whole tuple is domain-tagged so the digest can never collide with
//! another hashing scheme in this codebase.

use serde::{Deserialize, Serialize};

use crate::task::{CompletionSnapshot, OwnerId};

/// Domain tag. Bump the trailing version only together with a migration plan
/// for fingerprints that are already anchored on the ledger.
const DOMAIN_TAG: &[u8] = b"taskanchor.completion.v1";

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Derive the fingerprint for a completion. Pure and total: same snapshot
    /// and owner always produce the same digest, and there is no failure mode.
    pub fn derive(snapshot: &CompletionSnapshot, owner: &OwnerId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN_TAG);
        update_field(&mut hasher, snapshot.title.as_bytes());
        update_field(&mut hasher, snapshot.description.as_bytes());
        update_field(&mut hasher, snapshot.status.as_str().as_bytes());
        hasher.update(&snapshot.due.timestamp_millis().to_le_bytes());
        update_field(&mut hasher, owner.as_str().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for b in self.0 {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = ((hi << 4) | lo) as u8;
        }
        Some(Self(bytes))
    }
}

fn update_field(hasher: &mut blake3::Hasher, field: &[u8]) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field);
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Hex on the wire: fingerprints travel through JSON bodies and journal lines.
impl Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s).ok_or_else(|| serde::de::Error::custom("expected 64 hex chars"))
    }
}
