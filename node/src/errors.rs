// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use taskanchor_core::error::{CompletionError, RetryHint};
use taskanchor_core::store::StoreError;

use crate::advisor::AdvisorError;
use crate::auth::AuthError;
use crate::users::UserError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Advisor(#[from] AdvisorError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Completion(err) => completion_response(err),
            ApiError::Store(err) => {
                let status = match err {
                    StoreError::NotFound => StatusCode::NOT_FOUND,
                    StoreError::Conflict => StatusCode::CONFLICT,
                    StoreError::InvalidPatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, json!({ "error": err.to_string() }))
            }
            ApiError::User(err) => {
                let status = match err {
                    UserError::EmailTaken => StatusCode::CONFLICT,
                    UserError::BadCredentials => StatusCode::UNAUTHORIZED,
                    UserError::MissingFields => StatusCode::BAD_REQUEST,
                    UserError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, json!({ "error": err.to_string() }))
            }
            ApiError::Auth(err) => (StatusCode::UNAUTHORIZED, json!({ "error": err.to_string() })),
            ApiError::Advisor(err) => {
                let status = match err {
                    AdvisorError::Disabled => StatusCode::NOT_IMPLEMENTED,
                    AdvisorError::Upstream(_) => StatusCode::BAD_GATEWAY,
                };
                (status, json!({ "error": err.to_string() }))
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

/// Completion failures each get a distinct status + message, and the body
/// carries the retry hint. The divergence case additionally ships the
/// fingerprint and receipt so the caller can drive the store-only retry.
fn completion_response(err: &CompletionError) -> (StatusCode, serde_json::Value) {
    let retry = match err.retry_hint() {
        RetryHint::NoRetry => "none",
        RetryHint::RetryFlow => "flow",
        RetryHint::RetryPersistOnly => "persist",
    };

    let status = match err {
        CompletionError::Unauthorized => StatusCode::UNAUTHORIZED,
        CompletionError::NotFound => StatusCode::NOT_FOUND,
        CompletionError::SessionNotReady => StatusCode::PRECONDITION_FAILED,
        CompletionError::UnsupportedNetwork(_) => StatusCode::PRECONDITION_FAILED,
        CompletionError::SessionChanged => StatusCode::CONFLICT,
        CompletionError::WriteRejectedByUser => StatusCode::FORBIDDEN,
        CompletionError::AlreadyCompleted { .. } => StatusCode::CONFLICT,
        CompletionError::Conflict => StatusCode::CONFLICT,
        CompletionError::LedgerUnavailable(_) | CompletionError::StoreUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CompletionError::PersistAfterLedgerSuccess { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match err {
        CompletionError::PersistAfterLedgerSuccess { fingerprint, receipt, reason } => json!({
            "error": err.to_string(),
            "retry": retry,
            "fingerprint": fingerprint,
            "receipt": receipt,
            "reason": reason,
        }),
        CompletionError::AlreadyCompleted { completer } => json!({
            "error": err.to_string(),
            "retry": retry,
            "completer": completer,
        }),
        _ => json!({ "error": err.to_string(), "retry": retry }),
    };

    (status, body)
}
