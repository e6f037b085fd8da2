// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-core: domain types for the herd process-group registry

pub mod clock;
pub mod config;
pub mod entry;
pub mod member;
pub mod name;
pub mod reason;
pub mod stamp;
pub mod token;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, RegistryConfig};
pub use entry::{Entry, SnapshotEntry};
pub use member::{MemberRef, NodeId, TaskId};
pub use name::{GroupName, ScopeName};
pub use reason::Reason;
pub use stamp::{Stamp, StampSource};
pub use token::{CallToken, MonitorRef};

/// Opaque per-member metadata attached at join time and carried to
/// callbacks, queries, and peer nodes. Compared by equality only.
pub type Meta = serde_json::Value;
