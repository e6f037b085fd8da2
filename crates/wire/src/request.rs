// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use herd_core::{GroupName, MemberRef, Meta, NodeId};
use serde::{Deserialize, Serialize};

/// Owner-routed mutation requests.
///
/// A join or leave for a member hosted elsewhere is forwarded to the
/// owning node, which serializes all mutations for its members through
/// one scope task. `requester` identifies the calling node so the owner
/// can exclude it from the resulting broadcast (the caller applies the
/// mutation eagerly from the reply instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RpcRequest {
    #[serde(rename = "join:on_node")]
    JoinOnNode { requester: NodeId, group: GroupName, member: MemberRef, meta: Meta },

    #[serde(rename = "leave:on_node")]
    LeaveOnNode { requester: NodeId, group: GroupName, member: MemberRef },
}
