// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partitions, peer-down purges, and anti-entropy on heal.

use crate::harness::{group, scope, settle, Cluster};
use herd_core::{NodeId, Reason};
use herd_registry::CallbackKind;
use serde_json::json;

#[tokio::test]
async fn join_during_partition_heals_via_snapshot_exchange() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    settle(&[&a, &b]).await;

    cluster.mesh.disconnect("a", "b").await;
    let member = cluster.member("a");
    a.registry.join(&scope(), group("g"), member.clone(), json!("m")).await.unwrap();
    settle(&[&a, &b]).await;
    assert!(!b.registry.is_member(&scope(), &group("g"), &member).unwrap());
    b.handler.take();

    cluster.mesh.connect("a", "b").await;
    settle(&[&a, &b]).await;

    // b learned the entry through anti-entropy, tagged with the peer-up.
    assert!(b.registry.is_member(&scope(), &group("g"), &member).unwrap());
    let records = b.handler.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, CallbackKind::Joined);
    assert_eq!(records[0].reason, Reason::NodeUp { node: NodeId::new("a") });

    // Nothing was lost on a.
    assert!(a.registry.is_member(&scope(), &group("g"), &member).unwrap());
}

#[tokio::test]
async fn partition_purges_remote_entries_with_node_down() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let on_b = cluster.member("b");

    b.registry.join(&scope(), group("g"), on_b.clone(), json!(1)).await.unwrap();
    settle(&[&a, &b]).await;
    assert!(a.registry.is_member(&scope(), &group("g"), &on_b).unwrap());
    a.handler.take();

    cluster.mesh.disconnect("a", "b").await;
    settle(&[&a, &b]).await;

    assert!(!a.registry.is_member(&scope(), &group("g"), &on_b).unwrap());
    let records = a.handler.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, CallbackKind::Left);
    assert_eq!(records[0].reason, Reason::NodeDown { node: NodeId::new("b") });

    // b keeps its own member; only the remote view was purged.
    assert!(b.registry.is_member(&scope(), &group("g"), &on_b).unwrap());
}

#[tokio::test]
async fn three_node_cluster_converges_after_flapping_link() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    let c = cluster.node("c");
    cluster.mesh.connect("a", "b").await;
    cluster.mesh.connect("a", "c").await;
    cluster.mesh.connect("b", "c").await;
    let member = cluster.member("a");

    a.registry.join(&scope(), group("g"), member.clone(), json!(1)).await.unwrap();
    settle(&[&a, &b, &c]).await;

    cluster.mesh.disconnect("a", "c").await;
    cluster.mesh.connect("a", "c").await;
    settle(&[&a, &b, &c]).await;

    for node in [&a, &b, &c] {
        assert_eq!(
            node.registry.members(&scope(), &group("g")).unwrap(),
            vec![(member.clone(), json!(1))]
        );
    }
}
