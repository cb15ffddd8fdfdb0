// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Process-wide signing-session handle.
//!
//! The signer and network live in an external signing environment (a wallet)
//! that pushes change events at its own pace. The handle is a watch channel:
//! writers apply events and bump the epoch, readers take cheap snapshots.
//! Nothing in the node ever mutates the session as part of a completion flow.

use serde::Deserialize;
use tokio::sync::watch;

use taskanchor_core::session::{ChainId, SessionSnapshot, SignerAddress};

/// Externally driven change, mirroring the wallet's own event vocabulary
/// (accounts changed, chain changed).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SignerAttached { signer: SignerAddress, chain: ChainId },
    SignerDetached,
    NetworkSwitched { chain: ChainId },
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionHandle {
    pub fn detached() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::detached());
        Self { tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Apply an external event. Every event bumps the epoch, so an in-flight
    /// completion started under the previous pairing can detect the change
    /// and abort instead of silently continuing.
    pub fn apply(&self, event: SessionEvent) -> SessionSnapshot {
        self.tx.send_modify(|session| {
            match event {
                SessionEvent::SignerAttached { signer, chain } => {
                    session.signer = Some(signer);
                    session.chain = Some(chain);
                }
                SessionEvent::SignerDetached => {
                    session.signer = None;
                }
                SessionEvent::NetworkSwitched { chain } => {
                    session.chain = Some(chain);
                }
            }
            session.epoch += 1;
        });
        let session = self.snapshot();
        tracing::info!(epoch = session.epoch, ready = session.is_ready(), "signing session changed");
        session
    }
}
