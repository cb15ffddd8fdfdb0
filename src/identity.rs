// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! Contract for the authenticated owner identity.

use thiserror::Error;

use crate::task::OwnerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no authenticated identity")]
    Unauthorized,
}

/// Supplies the owner identity used in fingerprinting and attributed as the
/// ledger-write signer. Consumed exactly once per coordinator run, before any
/// external call.
pub trait IdentityProvider: Send + Sync {
    fn current_owner(&self) -> Result<OwnerId, IdentityError>;
}
