// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! HTTP client for the ledger gateway.
//!
//! The gateway fronts the append-only ledger and the signing environment.
//! Status mapping is part of the contract: 409 means the fingerprint is
//! already recorded (same outcome as a pre-write query hit), 403 means the
//! signer declined. Anything else network-shaped is `Unavailable`, and an
//! ambiguous append (timeout after submission) is never retried here - the
//! coordinator re-queries instead.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use taskanchor_core::fingerprint::Fingerprint;
use taskanchor_core::ledger::{CompletionLedger, CompletionReceipt, LedgerError};
use taskanchor_core::session::{network_info, ChainId, SessionSnapshot, SignerAddress};

use crate::session::SessionHandle;

#[derive(Debug, Clone)]
pub struct LedgerHttpClient {
    base_url: String,
    client: Client,
    sessions: SessionHandle,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    fingerprint: &'a Fingerprint,
}

#[derive(Deserialize)]
struct QueryResponse {
    completer: Option<SignerAddress>,
}

#[derive(Serialize)]
struct AppendRequest<'a> {
    fingerprint: &'a Fingerprint,
    signer: &'a SignerAddress,
    chain_id: ChainId,
}

#[derive(Deserialize)]
struct AppendResponse {
    tx_id: String,
    block: Option<u64>,
}

#[derive(Deserialize, Default)]
struct RejectionBody {
    completer: Option<SignerAddress>,
}

impl LedgerHttpClient {
    pub fn new(url: String, timeout: std::time::Duration, sessions: SessionHandle) -> Self {
        let client = Client::builder().timeout(timeout).build().expect("reqwest client");
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            client,
            sessions,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_signer(&self, session: &SessionSnapshot) -> Result<(SignerAddress, ChainId), LedgerError> {
        let signer = session.signer.clone().ok_or(LedgerError::SessionNotReady)?;
        let chain = session.chain.ok_or(LedgerError::SessionNotReady)?;
        if network_info(chain).is_none() {
            return Err(LedgerError::UnsupportedNetwork { chain });
        }
        Ok((signer, chain))
    }
}

#[async_trait]
impl CompletionLedger for LedgerHttpClient {
    fn session(&self) -> SessionSnapshot {
        self.sessions.snapshot()
    }

    async fn query_completion(&self, fingerprint: &Fingerprint) -> Result<Option<SignerAddress>, LedgerError> {
        let url = format!("{}/v1/completions/query", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&QueryRequest { fingerprint })
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LedgerError::Unavailable(format!("query failed: {}", resp.status())));
        }

        let body: QueryResponse = resp.json().await.map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(body.completer)
    }

    async fn append_completion(&self, fingerprint: &Fingerprint) -> Result<CompletionReceipt, LedgerError> {
        let session = self.sessions.snapshot();
        let (signer, chain) = self.ready_signer(&session)?;

        let url = format!("{}/v1/completions/append", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&AppendRequest { fingerprint, signer: &signer, chain_id: chain })
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        match resp.status() {
            StatusCode::CONFLICT => {
                let body: RejectionBody = resp.json().await.unwrap_or_default();
                Err(LedgerError::AlreadyCompleted { completer: body.completer })
            }
            StatusCode::FORBIDDEN => Err(LedgerError::WriteRejectedByUser),
            status if !status.is_success() => {
                Err(LedgerError::Unavailable(format!("append failed: {status}")))
            }
            _ => {
                let body: AppendResponse =
                    resp.json().await.map_err(|e| LedgerError::Unavailable(e.to_string()))?;
                tracing::info!(%fingerprint, tx_id = %body.tx_id, "ledger append confirmed");
                Ok(CompletionReceipt { tx_id: body.tx_id, block: body.block })
            }
        }
    }
}
