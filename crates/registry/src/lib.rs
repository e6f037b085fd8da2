// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-registry: per-scope cluster coordination engine.
//!
//! Each scope on each node is one serialization point: a [`Scope`] handle
//! feeding a single event-loop task that owns the dual-index store, the
//! liveness subscriptions, and all peer broadcasts. Mutations route to the
//! member's owning node; replication is last-writer-wins on owner-assigned
//! stamps; queries read the shared indexes directly without touching the
//! task.

pub mod adapters;
pub mod error;
pub mod fanout;
mod queries;
pub mod registry;
pub mod scope;
pub mod store;

pub use adapters::{DeathNotice, EventHandler, Liveness, Transport, TransportError};
pub use error::ScopeError;
pub use fanout::{CallEnvelope, MemberMessage, MultiCallResult};
pub use registry::Registry;
pub use scope::{JoinOutcome, Scope, ScopeDeps};
pub use store::{Merge, ScopeStore};

#[cfg(any(test, feature = "test-support"))]
pub use adapters::fake::{
    CallbackKind, CallbackRecord, FakeLiveness, FakeMesh, RecordingHandler,
};
