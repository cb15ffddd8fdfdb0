// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use tokio::net::TcpListener;

use taskanchor_node::advisor::AdvisorClient;
use taskanchor_node::auth::AuthKeys;
use taskanchor_node::config::NodeConfig;
use taskanchor_node::engine::Engine;
use taskanchor_node::network::client::LedgerHttpClient;
use taskanchor_node::server::{build_router, AppState};
use taskanchor_node::session::SessionHandle;
use taskanchor_node::store::JournalStore;
use taskanchor_node::telemetry;

#[tokio::main]
async fn main() {
    telemetry::init_telemetry();

    let cfg = NodeConfig::from_env();
    tracing::info!("Initializing TaskAnchor node with config: {:?}", cfg);

    let store = match JournalStore::open(&cfg.journal_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            // A journal we cannot replay means unknown task state. Fail is
            // safer than serving empty.
            tracing::error!("Failed to open journal: {:?}", e);
            panic!("Failed to open journal");
        }
    };

    let sessions = SessionHandle::detached();
    let ledger = Arc::new(LedgerHttpClient::new(
        cfg.ledger_url.clone(),
        cfg.ledger_timeout,
        sessions.clone(),
    ));
    let advisor = AdvisorClient::new(cfg.advisor_url.clone(), cfg.advisor_model.clone());

    let engine = Arc::new(Engine::new(store, ledger, sessions, advisor));
    let auth = Arc::new(AuthKeys::new(&cfg.auth_secret, cfg.token_ttl));

    let app = build_router(AppState { engine, auth }, &cfg.cors_origins);

    let addr = cfg.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
