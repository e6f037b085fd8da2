// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle transition reasons.
//!
//! Carried on every replication message and handed to event callbacks so
//! observers can distinguish a deliberate leave from a death or a cluster
//! topology change.

use crate::member::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a membership transition happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reason {
    /// Direct user join/leave.
    #[serde(rename = "normal")]
    Normal,

    /// The member task exited; carries the task's exit reason.
    #[serde(rename = "killed")]
    Killed { detail: String },

    /// Entry learned through anti-entropy when a peer (re)joined the
    /// cluster.
    #[serde(rename = "node_up")]
    NodeUp { node: NodeId },

    /// Entry purged because its owner node left the cluster.
    #[serde(rename = "node_down")]
    NodeDown { node: NodeId },

    /// Death observed while rebuilding monitors after a scope task
    /// restart; the original exit reason is unknown.
    #[serde(rename = "undefined")]
    Undefined,
}

impl Reason {
    pub fn killed(detail: impl Into<String>) -> Self {
        Reason::Killed { detail: detail.into() }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Reason::Normal)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Normal => f.write_str("normal"),
            Reason::Killed { detail } => write!(f, "killed: {}", detail),
            Reason::NodeUp { node } => write!(f, "node_up: {}", node),
            Reason::NodeDown { node } => write!(f, "node_down: {}", node),
            Reason::Undefined => f.write_str("undefined"),
        }
    }
}

#[cfg(test)]
#[path = "reason_tests.rs"]
mod tests;
