// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use taskanchor_core::session::DEFAULT_NETWORK;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Append-only journal holding tasks and users; replayed on startup.
    pub journal_path: PathBuf,
    /// Base URL of the ledger gateway.
    pub ledger_url: String,
    pub ledger_timeout: Duration,
    /// HMAC secret for auth tokens.
    pub auth_secret: String,
    pub token_ttl: Duration,
    /// Base URL of the text-generation service backing the advisor, if any.
    pub advisor_url: Option<String>,
    pub advisor_model: String,
    /// Origins allowed by CORS (the web frontend during development).
    pub cors_origins: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            journal_path: PathBuf::from("taskanchor.journal"),
            ledger_url: format!("http://127.0.0.1:8545/chains/{DEFAULT_NETWORK}"),
            ledger_timeout: Duration::from_secs(30),
            auth_secret: "dev-secret-change-me".to_string(),
            token_ttl: Duration::from_secs(60 * 60 * 24),
            advisor_url: None,
            advisor_model: "gemini-1.0-pro".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl NodeConfig {
    /// Environment overrides on top of the defaults. Unset vars keep the
    /// default; malformed values fail loudly at startup rather than limping.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(addr) = std::env::var("TASKANCHOR_BIND") {
            cfg.bind_addr = addr.parse().expect("TASKANCHOR_BIND must be host:port");
        }
        if let Ok(path) = std::env::var("TASKANCHOR_JOURNAL") {
            cfg.journal_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("TASKANCHOR_LEDGER_URL") {
            cfg.ledger_url = url;
        }
        if let Ok(secs) = std::env::var("TASKANCHOR_LEDGER_TIMEOUT_SECS") {
            cfg.ledger_timeout =
                Duration::from_secs(secs.parse().expect("TASKANCHOR_LEDGER_TIMEOUT_SECS must be a number"));
        }
        if let Ok(secret) = std::env::var("TASKANCHOR_AUTH_SECRET") {
            cfg.auth_secret = secret;
        }
        if let Ok(secs) = std::env::var("TASKANCHOR_TOKEN_TTL_SECS") {
            cfg.token_ttl =
                Duration::from_secs(secs.parse().expect("TASKANCHOR_TOKEN_TTL_SECS must be a number"));
        }
        if let Ok(url) = std::env::var("TASKANCHOR_ADVISOR_URL") {
            cfg.advisor_url = Some(url);
        }
        if let Ok(model) = std::env::var("TASKANCHOR_ADVISOR_MODEL") {
            cfg.advisor_model = model;
        }
        if let Ok(origins) = std::env::var("TASKANCHOR_CORS_ORIGINS") {
            cfg.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }
        cfg
    }
}
