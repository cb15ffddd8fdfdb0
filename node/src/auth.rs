// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Cookie-based auth: salted password hashes and signed session tokens.
//!
//! The token is a JWT in the `token` cookie (a `Bearer` header is accepted
//! too). Validation only proves who the caller is; task scoping is enforced
//! by the store, and the signing session for ledger writes is a separate
//! concern entirely.

use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use taskanchor_core::identity::{IdentityError, IdentityProvider};
use taskanchor_core::task::OwnerId;

use crate::users::UserRecord;

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("please provide token")]
    MissingToken,

    #[error("token is invalid or expired")]
    InvalidToken,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    full_name: String,
    iat: i64,
    exp: i64,
}

/// The authenticated caller, inserted into request extensions by the auth
/// middleware and consumed by handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl AuthUser {
    pub fn owner_id(&self) -> OwnerId {
        OwnerId(self.id.to_string())
    }
}

impl IdentityProvider for AuthUser {
    fn current_owner(&self) -> Result<OwnerId, IdentityError> {
        Ok(self.owner_id())
    }
}

pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl AuthKeys {
    pub fn new(secret: &str, ttl: std::time::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl.as_secs() as i64,
        }
    }

    pub fn mint(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthError::InvalidToken)
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
            full_name: data.claims.full_name,
        })
    }
}

pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

pub fn verify_password(user: &UserRecord, password: &str) -> bool {
    hash_password(&user.salt, password) == user.password_hash
}
