// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use herd_core::{Meta, Stamp};
use serde::{Deserialize, Serialize};

/// Owner's reply to an [`RpcRequest`](crate::RpcRequest).
///
/// Join replies carry the stamp the owner assigned and leave replies the
/// meta it observed, which is exactly what the requester needs to apply
/// the mutation to its own indexes before the broadcast arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RpcReply {
    #[serde(rename = "join:joined")]
    Joined { stamp: Stamp },

    #[serde(rename = "join:updated")]
    Updated { stamp: Stamp },

    /// Re-join with identical meta; nothing changed, nothing to apply.
    #[serde(rename = "join:noop")]
    Noop,

    #[serde(rename = "leave:left")]
    Left { meta: Meta },

    #[serde(rename = "error")]
    Error { kind: ReplyError },
}

/// Failure modes an owner reports back to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyError {
    NotAlive,
    NotInGroup,
    InvalidScope,
}
