// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use taskanchor_core::task::OwnerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub salt: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(full_name: String, email: String, salt: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            salt,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// The owner identity tasks are scoped by and fingerprints include.
    pub fn owner_id(&self) -> OwnerId {
        OwnerId(self.id.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("incorrect password or email")]
    BadCredentials,

    #[error("signup needs a name, an email and a password")]
    MissingFields,

    #[error("store unavailable: {0}")]
    Store(String),
}
