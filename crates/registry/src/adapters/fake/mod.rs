// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for multi-node tests.
//!
//! [`FakeMesh`] plays the whole cluster transport: it routes RPCs and
//! replication traffic between registered scopes, owns member inboxes,
//! and turns `connect`/`disconnect` into peer-up/peer-down signals, which
//! makes partitions and heals one method call. [`FakeLiveness`] is the
//! matching monitor primitive with an explicit kill switch.

mod handler;
mod liveness;
mod mesh;

pub use handler::{CallbackKind, CallbackRecord, RecordingHandler};
pub use liveness::FakeLiveness;
pub use mesh::{FakeMesh, MeshTransport};
