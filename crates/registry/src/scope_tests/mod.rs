// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope engine tests over the in-memory mesh.

mod fanout;
mod join_leave;
mod liveness;
mod membership;
mod properties;
mod replicate;

use crate::adapters::fake::{FakeLiveness, FakeMesh, RecordingHandler};
use crate::scope::{Scope, ScopeDeps};
use herd_core::{FakeClock, GroupName, MemberRef, RegistryConfig, ScopeName};
use std::sync::Arc;

pub(crate) const SCOPE: &str = "users";

/// One fake cluster: shared mesh, shared liveness, one clock.
pub(crate) struct TestCluster {
    pub mesh: FakeMesh,
    pub liveness: FakeLiveness,
    pub clock: FakeClock,
}

pub(crate) struct TestNode {
    pub scope: Scope,
    pub handler: RecordingHandler,
}

impl TestCluster {
    pub fn new() -> Self {
        Self { mesh: FakeMesh::new(), liveness: FakeLiveness::new(), clock: FakeClock::new() }
    }

    /// Start the test scope on a node and register it with the mesh.
    pub fn start_node(&self, name: &str) -> TestNode {
        let handler = RecordingHandler::new();
        let deps = ScopeDeps {
            transport: self.mesh.transport(name),
            liveness: Arc::new(self.liveness.clone()),
            handler: Arc::new(handler.clone()),
        };
        let scope = Scope::spawn(
            ScopeName::new(SCOPE),
            &RegistryConfig::for_node(name),
            deps,
            self.clock.clone(),
        );
        self.mesh.register_scope(&scope);
        TestNode { scope, handler }
    }

    /// Mint an alive member on `name`, discarding its inbox.
    pub fn spawn_member(&self, name: &str) -> MemberRef {
        let (member, _rx) = self.mesh.add_member(name);
        self.liveness.register(&member);
        member
    }
}

pub(crate) fn group(name: &str) -> GroupName {
    GroupName::new(name)
}

/// Drain every queue twice so multi-hop traffic (command, then the
/// broadcast it produced) has fully landed.
pub(crate) async fn settle(nodes: &[&TestNode]) {
    for _ in 0..2 {
        for node in nodes {
            node.scope.flush().await.unwrap();
        }
    }
}
