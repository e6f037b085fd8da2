// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-surface errors.

use crate::adapters::TransportError;
use herd_core::ScopeName;
use herd_wire::ReplyError;
use thiserror::Error;

/// Errors surfaced to registry callers.
///
/// `NotAlive` and `NotInGroup` are ordinary outcomes of racing against
/// member lifecycles, not faults; transport failures leave local state
/// untouched.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("invalid scope: {0}")]
    InvalidScope(ScopeName),

    #[error("member is not alive")]
    NotAlive,

    #[error("member is not in group")]
    NotInGroup,

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The owner answered with a reply the request cannot have produced.
    #[error("unexpected rpc reply")]
    BadReply,

    /// The scope task is gone; the handle is stale.
    #[error("scope task stopped")]
    Closed,
}

impl ScopeError {
    pub(crate) fn from_reply(kind: ReplyError, scope: &ScopeName) -> Self {
        match kind {
            ReplyError::NotAlive => ScopeError::NotAlive,
            ReplyError::NotInGroup => ScopeError::NotInGroup,
            ReplyError::InvalidScope => ScopeError::InvalidScope(scope.clone()),
        }
    }
}
