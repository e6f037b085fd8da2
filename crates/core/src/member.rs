// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node identity and member handles.
//!
//! A [`MemberRef`] is the cluster-unique, addressable identity of a live
//! task. The node hosting the task is part of the handle, so ownership is
//! derivable without a lookup: the owning node is the sole assigner of the
//! member's replication stamps.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Identity of a cluster node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(SmolStr);

impl NodeId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Node-local task identity. Minted once when the task registers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(SmolStr);

impl TaskId {
    /// Generate a fresh random task ID.
    pub fn mint() -> Self {
        Self(SmolStr::new(nanoid::nanoid!(19)))
    }

    /// Create from an existing string (for parsing/deserialization).
    pub fn from_string(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cluster-unique, addressable handle of a live task.
///
/// Equality is identity: two handles compare equal iff they denote the
/// same task instance. A task that exits and restarts gets a new handle.
///
/// Displays as `node/task` and serializes as a struct, so handles survive
/// the wire without a registry round trip.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    node: NodeId,
    task: TaskId,
}

impl MemberRef {
    pub fn new(node: NodeId, task: TaskId) -> Self {
        Self { node, task }
    }

    /// Mint a handle for a fresh task hosted on `node`.
    pub fn mint(node: NodeId) -> Self {
        Self { node, task: TaskId::mint() }
    }

    /// The node hosting this member (its owner node).
    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn task(&self) -> &TaskId {
        &self.task
    }

    pub fn is_owned_by(&self, node: &NodeId) -> bool {
        &self.node == node
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.task)
    }
}

#[cfg(test)]
#[path = "member_tests.rs"]
mod tests;
