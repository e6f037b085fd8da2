// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration for a registry node.

use crate::member::NodeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Per-node registry settings. One instance is shared by every scope a
/// node hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Identity of this node in the cluster.
    pub node: NodeId,
    /// Timeout for owner-routed join/leave calls, in milliseconds.
    pub call_timeout_ms: u64,
    /// Scope task command queue depth. Replication broadcasts arriving
    /// beyond this depth are dropped (best-effort delivery).
    pub queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { node: NodeId::new("local"), call_timeout_ms: 5_000, queue_capacity: 1_024 }
    }
}

impl RegistryConfig {
    pub fn for_node(node: impl Into<NodeId>) -> Self {
        Self { node: node.into(), ..Self::default() }
    }

    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Configuration load/parse failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid registry config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
