// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque reference tokens.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Handle of an active liveness subscription, minted by the liveness
/// adapter. Opaque to the engine; compared by equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorRef(SmolStr);

impl MonitorRef {
    /// Mint a fresh reference. Called by liveness adapters, one per
    /// subscription.
    pub fn mint() -> Self {
        Self(SmolStr::new(nanoid::nanoid!(19)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation token for one scatter/gather call leg. A reply is accepted
/// only when it echoes the token it was asked with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallToken(SmolStr);

impl CallToken {
    pub fn mint() -> Self {
        Self(SmolStr::new(nanoid::nanoid!(19)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
