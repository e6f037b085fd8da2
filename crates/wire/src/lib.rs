// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-wire: node-to-node protocol for the herd registry.
//!
//! Every cross-node message travels inside an [`Envelope`] tagged with the
//! protocol version and the destination scope. A node rejects envelopes
//! whose version differs from its own; mixed-version clusters are not
//! supported.

mod broadcast;
mod request;
mod response;

pub use broadcast::Broadcast;
pub use request::RpcRequest;
pub use response::{ReplyError, RpcReply};

use herd_core::ScopeName;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol version spoken by this build.
pub const PROTOCOL_VERSION: &str = "3.0";

/// Versioned carrier for every cross-node message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub proto: String,
    pub scope: ScopeName,
    pub body: T,
}

impl<T: Serialize + DeserializeOwned> Envelope<T> {
    pub fn new(scope: ScopeName, body: T) -> Self {
        Self { proto: PROTOCOL_VERSION.to_string(), scope, body }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode and check the version tag.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let envelope: Self = serde_json::from_slice(bytes)?;
        if envelope.proto != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                ours: PROTOCOL_VERSION.to_string(),
                theirs: envelope.proto,
            });
        }
        Ok(envelope)
    }
}

/// Errors from message encode/decode.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("protocol version mismatch: ours {ours}, theirs {theirs}")]
    VersionMismatch { ours: String, theirs: String },

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
