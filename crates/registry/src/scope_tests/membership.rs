// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::adapters::fake::CallbackKind;
use crate::scope::{Scope, ScopeDeps};
use crate::store::ScopeStore;
use herd_core::{Entry, NodeId, Reason, RegistryConfig, ScopeName};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn peer_down_purges_that_nodes_entries() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let on_a = cluster.spawn_member("a");
    let on_b = cluster.spawn_member("b");

    a.scope.join(group("g"), on_a.clone(), json!("a")).await.unwrap();
    b.scope.join(group("g"), on_b.clone(), json!("b")).await.unwrap();
    settle(&[&a, &b]).await;
    assert_eq!(a.scope.member_count(&group("g")), 2);
    a.handler.take();

    cluster.mesh.disconnect("a", "b").await;
    settle(&[&a, &b]).await;

    // a kept only its own member; b's entry left with node_down.
    assert_eq!(a.scope.members(&group("g")), vec![(on_a.clone(), json!("a"))]);
    let records = a.handler.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, CallbackKind::Left);
    assert_eq!(records[0].reason, Reason::NodeDown { node: NodeId::new("b") });
    assert!(a.scope.peers().is_empty());
}

#[tokio::test]
async fn peer_up_exchanges_full_snapshots() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    let on_a = cluster.spawn_member("a");
    let on_b = cluster.spawn_member("b");

    // Populate both sides while disconnected.
    a.scope.join(group("g"), on_a.clone(), json!("a")).await.unwrap();
    b.scope.join(group("g"), on_b.clone(), json!("b")).await.unwrap();

    cluster.mesh.connect("a", "b").await;
    settle(&[&a, &b]).await;

    assert_eq!(a.scope.member_count(&group("g")), 2);
    assert_eq!(b.scope.member_count(&group("g")), 2);

    let learned = a
        .handler
        .for_member(&on_b)
        .into_iter()
        .find(|r| r.kind == CallbackKind::Joined)
        .unwrap();
    assert_eq!(learned.reason, Reason::NodeUp { node: NodeId::new("b") });
    assert_eq!(a.scope.peers(), vec![NodeId::new("b")]);
}

#[tokio::test]
async fn anti_entropy_does_not_remove_absent_entries() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let on_a = cluster.spawn_member("a");

    a.scope.join(group("g"), on_a.clone(), json!(1)).await.unwrap();
    settle(&[&a, &b]).await;

    // Reconnect cycles must not drop entries the peer's snapshot lacks
    // locally; removals travel only as leaves or peer-downs.
    cluster.mesh.disconnect("a", "b").await;
    cluster.mesh.connect("a", "b").await;
    settle(&[&a, &b]).await;

    assert!(a.scope.is_member(&group("g"), &on_a));
    assert!(b.scope.is_member(&group("g"), &on_a));
}

#[tokio::test]
async fn restart_rebuilds_local_monitors_and_drops_the_dead() {
    let cluster = TestCluster::new();
    let alive = cluster.spawn_member("a");
    let dead = cluster.spawn_member("a");
    let remote = cluster.spawn_member("b");
    cluster.liveness.kill(&dead, "lost");

    // Indexes as they might survive a scope task crash.
    let mut store = ScopeStore::new();
    for (member, stamp) in [(&alive, 10), (&dead, 11)] {
        store.insert(Entry {
            group: group("g"),
            member: member.clone(),
            meta: json!(1),
            stamp,
            monitor: None,
            owner: NodeId::new("a"),
        });
    }
    store.insert(Entry {
        group: group("g"),
        member: remote.clone(),
        meta: json!(2),
        stamp: 12,
        monitor: None,
        owner: NodeId::new("b"),
    });

    let handler = crate::adapters::fake::RecordingHandler::new();
    let deps = ScopeDeps {
        transport: cluster.mesh.transport("a"),
        liveness: Arc::new(cluster.liveness.clone()),
        handler: Arc::new(handler.clone()),
    };
    let scope = Scope::spawn_with_store(
        ScopeName::new(SCOPE),
        &RegistryConfig::for_node("a"),
        deps,
        cluster.clock.clone(),
        store,
    );
    scope.flush().await.unwrap();

    // Remote entries purged silently; dead local member left with an
    // unknown reason; the survivor is monitored again.
    assert!(!scope.is_member(&group("g"), &remote));
    assert!(!scope.is_member(&group("g"), &dead));
    assert!(scope.is_member(&group("g"), &alive));
    let records = handler.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].member, dead);
    assert_eq!(records[0].reason, Reason::Undefined);
    assert_eq!(cluster.liveness.subscription_count(&alive), 1);
}

#[tokio::test]
async fn peer_up_for_self_is_ignored() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    a.scope.peer_up(NodeId::new("a")).await.unwrap();
    settle(&[&a]).await;
    assert!(a.scope.peers().is_empty());
}
