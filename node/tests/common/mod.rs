// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Shared scaffolding for the HTTP-level tests: an in-memory ledger double
//! wired to the node's real session handle, and cookie-carrying request
//! helpers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use taskanchor_core::fingerprint::Fingerprint;
use taskanchor_core::ledger::{CompletionLedger, CompletionReceipt, LedgerError};
use taskanchor_core::session::{ChainId, SessionSnapshot, SignerAddress};

use taskanchor_node::advisor::AdvisorClient;
use taskanchor_node::auth::AuthKeys;
use taskanchor_node::engine::Engine;
use taskanchor_node::server::{build_router, AppState};
use taskanchor_node::session::SessionHandle;
use taskanchor_node::store::JournalStore;

pub struct MockLedger {
    sessions: SessionHandle,
    records: Mutex<HashMap<[u8; 32], SignerAddress>>,
    pub appends: AtomicU64,
    pub reject_writes: AtomicBool,
}

impl MockLedger {
    pub fn new(sessions: SessionHandle) -> Self {
        Self {
            sessions,
            records: Mutex::new(HashMap::new()),
            appends: AtomicU64::new(0),
            reject_writes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CompletionLedger for MockLedger {
    fn session(&self) -> SessionSnapshot {
        self.sessions.snapshot()
    }

    async fn query_completion(&self, fingerprint: &Fingerprint) -> Result<Option<SignerAddress>, LedgerError> {
        Ok(self.records.lock().unwrap().get(fingerprint.as_bytes()).cloned())
    }

    async fn append_completion(&self, fingerprint: &Fingerprint) -> Result<CompletionReceipt, LedgerError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::WriteRejectedByUser);
        }
        let signer = self.sessions.snapshot().signer.ok_or(LedgerError::SessionNotReady)?;
        let mut records = self.records.lock().unwrap();
        if let Some(completer) = records.get(fingerprint.as_bytes()) {
            return Err(LedgerError::AlreadyCompleted { completer: Some(completer.clone()) });
        }
        records.insert(*fingerprint.as_bytes(), signer);
        let height = records.len() as u64;
        Ok(CompletionReceipt { tx_id: format!("0xtx{height:04}"), block: Some(height) })
    }
}

pub struct TestApp {
    pub app: Router,
    pub engine: Arc<Engine>,
    pub ledger: Arc<MockLedger>,
    pub sessions: SessionHandle,
}

pub fn build_app(journal: &Path) -> TestApp {
    let store = Arc::new(JournalStore::open(journal).unwrap());
    let sessions = SessionHandle::detached();
    let ledger = Arc::new(MockLedger::new(sessions.clone()));
    let advisor = AdvisorClient::new(None, "test".to_string());
    let engine = Arc::new(Engine::new(store, ledger.clone(), sessions.clone(), advisor));
    let auth = Arc::new(AuthKeys::new("test-secret", std::time::Duration::from_secs(3600)));
    let app = build_router(AppState { engine: engine.clone(), auth }, &[]);
    TestApp { app, engine, ledger, sessions }
}

pub fn attach_signer(sessions: &SessionHandle) {
    sessions.apply(taskanchor_node::session::SessionEvent::SignerAttached {
        signer: SignerAddress("0xabc0".to_string()),
        chain: ChainId(11_155_111),
    });
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", format!("token={cookie}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user and return the session token from the signin cookie.
pub async fn signup_and_signin(app: &Router, email: &str) -> String {
    let resp = send(
        app,
        json_request(
            "POST",
            "/user/signup",
            None,
            Some(serde_json::json!({ "full_name": "Test User", "email": email, "password": "hunter2" })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(
        app,
        json_request(
            "POST",
            "/user/signin",
            None,
            Some(serde_json::json!({ "email": email, "password": "hunter2" })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp
        .headers()
        .get("set-cookie")
        .expect("signin sets the token cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("token=")
        .to_string()
}
