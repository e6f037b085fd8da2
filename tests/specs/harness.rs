// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared cluster harness for the scenario tests.

use herd_core::{FakeClock, GroupName, MemberRef, NodeId, RegistryConfig, ScopeName};
use herd_registry::{
    FakeLiveness, FakeMesh, MemberMessage, RecordingHandler, Registry, Scope, ScopeDeps,
};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const SCOPE: &str = "groups";

/// One fake cluster: shared transport fabric, shared liveness, one clock.
pub struct Cluster {
    pub mesh: FakeMesh,
    pub liveness: FakeLiveness,
    pub clock: FakeClock,
}

/// A registry node participating in the test scope.
pub struct Node {
    pub registry: Registry,
    pub scope: Scope,
    pub handler: RecordingHandler,
}

impl Cluster {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
        Self { mesh: FakeMesh::new(), liveness: FakeLiveness::new(), clock: FakeClock::new() }
    }

    /// Boot a node serving the test scope.
    pub fn node(&self, name: &str) -> Node {
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
        let registry = Registry::new(NodeId::new(name));
        registry.add_scope(scope.clone());
        Node { registry, scope, handler }
    }

    /// An alive member hosted on `name`, inbox discarded.
    pub fn member(&self, name: &str) -> MemberRef {
        let (member, _rx) = self.mesh.add_member(name);
        self.liveness.register(&member);
        member
    }

    /// An alive member with its inbox, for fan-out scenarios.
    pub fn member_with_inbox(
        &self,
        name: &str,
    ) -> (MemberRef, mpsc::UnboundedReceiver<MemberMessage>) {
        let (member, rx) = self.mesh.add_member(name);
        self.liveness.register(&member);
        (member, rx)
    }
}

pub fn scope() -> ScopeName {
    ScopeName::new(SCOPE)
}

pub fn group(name: &str) -> GroupName {
    GroupName::new(name)
}

/// Flush every node twice so multi-hop traffic has landed.
pub async fn settle(nodes: &[&Node]) {
    for _ in 0..2 {
        for node in nodes {
            node.scope.flush().await.unwrap();
        }
    }
}
