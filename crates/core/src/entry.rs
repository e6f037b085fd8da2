// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry entries.

use crate::member::{MemberRef, NodeId};
use crate::name::GroupName;
use crate::stamp::Stamp;
use crate::token::MonitorRef;
use crate::Meta;
use serde::{Deserialize, Serialize};

/// One `(group, member)` membership as stored in the dual index.
///
/// `monitor` is populated only for locally owned entries; death of remote
/// members is learned through replication from their owner, never through
/// local monitoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub group: GroupName,
    pub member: MemberRef,
    pub meta: Meta,
    pub stamp: Stamp,
    pub monitor: Option<MonitorRef>,
    pub owner: NodeId,
}

impl Entry {
    pub fn is_local(&self, node: &NodeId) -> bool {
        &self.owner == node
    }

    /// Owner-side projection exchanged during anti-entropy.
    pub fn to_snapshot(&self) -> SnapshotEntry {
        SnapshotEntry {
            group: self.group.clone(),
            member: self.member.clone(),
            meta: self.meta.clone(),
            stamp: self.stamp,
        }
    }
}

/// Wire form of a locally owned entry, pushed to a peer on peer-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub group: GroupName,
    pub member: MemberRef,
    pub meta: Meta,
    pub stamp: Stamp,
}
