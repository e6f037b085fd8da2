// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use herd_core::{GroupName, MemberRef, Meta, NodeId, Reason, SnapshotEntry, Stamp};
use serde::{Deserialize, Serialize};

/// Best-effort replication messages fanned out to peers.
///
/// No acknowledgment; a peer that misses one converges later through the
/// snapshot exchange performed when the peers reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Broadcast {
    #[serde(rename = "sync:join")]
    SyncJoin { group: GroupName, member: MemberRef, meta: Meta, stamp: Stamp, reason: Reason },

    #[serde(rename = "sync:leave")]
    SyncLeave { group: GroupName, member: MemberRef, meta: Meta, reason: Reason },

    /// Full owned-entry snapshot, pushed to one peer when it enters the
    /// peer set. Applied entry-by-entry under the same last-writer-wins
    /// rule as `sync:join`.
    #[serde(rename = "sync:snapshot")]
    Snapshot { node: NodeId, entries: Vec<SnapshotEntry> },
}
