// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::adapters::fake::CallbackKind;
use herd_core::{NodeId, Reason};
use herd_wire::Broadcast;
use serde_json::json;

#[tokio::test]
async fn join_replicates_to_connected_peer() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.spawn_member("a");

    a.scope.join(group("chat"), member.clone(), json!(1)).await.unwrap();
    settle(&[&a, &b]).await;

    assert_eq!(b.scope.members(&group("chat")), vec![(member.clone(), json!(1))]);
    assert!(b.scope.is_member(&group("chat"), &member));
    assert!(!b.scope.is_local_member(&group("chat"), &member));
    assert_eq!(b.handler.count(CallbackKind::Joined), 1);
}

#[tokio::test]
async fn cross_node_join_is_visible_on_caller_before_broadcast() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    settle(&[&a, &b]).await;
    let member = cluster.spawn_member("a");

    // b initiates a join for a member that a owns.
    b.scope.join(group("g"), member.clone(), json!("m")).await.unwrap();

    // Visible on b without any settling: the reply was applied eagerly.
    assert!(b.scope.is_member(&group("g"), &member));

    settle(&[&a, &b]).await;
    assert!(a.scope.is_member(&group("g"), &member));
    // Exactly one joined callback per node: the owner fired its own, the
    // requester fired on eager apply and was excluded from the broadcast.
    assert_eq!(a.handler.count(CallbackKind::Joined), 1);
    assert_eq!(b.handler.count(CallbackKind::Joined), 1);
}

#[tokio::test]
async fn cross_node_leave_applies_eagerly_too() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.spawn_member("a");

    b.scope.join(group("g"), member.clone(), json!("m")).await.unwrap();
    b.scope.leave(group("g"), member.clone()).await.unwrap();
    assert!(!b.scope.is_member(&group("g"), &member));

    settle(&[&a, &b]).await;
    assert!(!a.scope.is_member(&group("g"), &member));
    assert_eq!(b.handler.count(CallbackKind::Left), 1);
}

#[tokio::test]
async fn eager_apply_lands_even_before_the_peer_up_signal() {
    let cluster = TestCluster::new();
    let _a = cluster.start_node("a");
    let b = cluster.start_node("b");
    // Transport is up but neither side has processed a peer-up yet; a
    // routed join can outrun the supervisor signal.
    cluster.mesh.link("a", "b");
    let member = cluster.spawn_member("a");

    b.scope.join(group("g"), member.clone(), json!("m")).await.unwrap();

    assert!(b.scope.peers().is_empty());
    assert!(b.scope.is_member(&group("g"), &member));
    assert_eq!(b.handler.count(CallbackKind::Joined), 1);

    b.scope.leave(group("g"), member.clone()).await.unwrap();
    assert!(!b.scope.is_member(&group("g"), &member));
    assert_eq!(b.handler.count(CallbackKind::Left), 1);
}

#[tokio::test]
async fn stale_sync_join_is_dropped_silently() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.spawn_member("a");

    a.scope.join(group("g"), member.clone(), json!("v1")).await.unwrap();
    settle(&[&a, &b]).await;
    let before = b.handler.records().len();

    // A delayed broadcast for the same pair with an older stamp.
    b.scope.handle_broadcast(
        NodeId::new("a"),
        Broadcast::SyncJoin {
            group: group("g"),
            member: member.clone(),
            meta: json!("old"),
            stamp: 50,
            reason: Reason::Normal,
        },
    );
    settle(&[&b]).await;

    assert_eq!(b.scope.members(&group("g")), vec![(member, json!("v1"))]);
    assert_eq!(b.handler.records().len(), before);
}

#[tokio::test]
async fn sync_join_from_unknown_owner_is_dropped() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    // Node c was never connected; its member must not materialize here.
    let stray = cluster.spawn_member("c");

    a.scope.handle_broadcast(
        NodeId::new("c"),
        Broadcast::SyncJoin {
            group: group("g"),
            member: stray.clone(),
            meta: json!(1),
            stamp: 999,
            reason: Reason::Normal,
        },
    );
    settle(&[&a]).await;

    assert!(!a.scope.is_member(&group("g"), &stray));
    assert!(a.handler.records().is_empty());
}

#[tokio::test]
async fn meta_update_reaches_peers_in_order() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.spawn_member("a");

    a.scope.join(group("g"), member.clone(), json!("m1")).await.unwrap();
    a.scope.join(group("g"), member.clone(), json!("m2")).await.unwrap();
    settle(&[&a, &b]).await;

    for node in [&a, &b] {
        let kinds: Vec<_> = node.handler.records().into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![CallbackKind::Joined, CallbackKind::Updated]);
    }
    assert_eq!(b.scope.members(&group("g")), vec![(member, json!("m2"))]);
}

#[tokio::test]
async fn sync_leave_for_absent_entry_is_ignored() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let _b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.spawn_member("b");

    a.scope.handle_broadcast(
        NodeId::new("b"),
        Broadcast::SyncLeave {
            group: group("g"),
            member,
            meta: json!(1),
            reason: Reason::Normal,
        },
    );
    settle(&[&a]).await;
    assert!(a.handler.records().is_empty());
}
