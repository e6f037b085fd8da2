// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::adapters::fake::CallbackKind;
use herd_core::Reason;
use serde_json::json;

#[tokio::test]
async fn death_purges_every_group_and_replicates() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.spawn_member("a");

    for g in ["g1", "g2", "g3"] {
        a.scope.join(group(g), member.clone(), json!(1)).await.unwrap();
    }
    settle(&[&a, &b]).await;
    a.handler.take();
    b.handler.take();

    cluster.liveness.kill(&member, "boom");
    settle(&[&a, &b]).await;

    for node in [&a, &b] {
        let records = node.handler.for_member(&member);
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.kind, CallbackKind::Left);
            assert_eq!(record.reason, Reason::killed("boom"));
        }
        assert!(node.scope.group_names().is_empty());
    }
    assert_eq!(cluster.liveness.subscription_count(&member), 0);
}

#[tokio::test]
async fn death_after_full_leave_is_spurious_and_harmless() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    node.scope.join(group("g"), member.clone(), json!(1)).await.unwrap();
    node.scope.leave(group("g"), member.clone()).await.unwrap();
    node.handler.take();

    // The monitor was released with the last entry; this kill must not
    // produce callbacks or take the scope down.
    cluster.liveness.kill(&member, "late");
    settle(&[&node]).await;
    assert!(node.handler.records().is_empty());

    // Scope still serves.
    let other = cluster.spawn_member("a");
    node.scope.join(group("g"), other.clone(), json!(2)).await.unwrap();
    assert!(node.scope.is_member(&group("g"), &other));
}

#[tokio::test]
async fn dead_member_cannot_rejoin_until_registered_again() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    node.scope.join(group("g"), member.clone(), json!(1)).await.unwrap();
    cluster.liveness.kill(&member, "boom");
    settle(&[&node]).await;

    assert!(node.scope.join(group("g"), member.clone(), json!(1)).await.is_err());
}

#[tokio::test]
async fn death_between_groups_does_not_leak_monitors() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let m1 = cluster.spawn_member("a");
    let m2 = cluster.spawn_member("a");

    node.scope.join(group("g1"), m1.clone(), json!(1)).await.unwrap();
    node.scope.join(group("g1"), m2.clone(), json!(2)).await.unwrap();
    node.scope.join(group("g2"), m1.clone(), json!(1)).await.unwrap();

    cluster.liveness.kill(&m1, "boom");
    settle(&[&node]).await;

    assert_eq!(cluster.liveness.subscription_count(&m1), 0);
    assert_eq!(cluster.liveness.subscription_count(&m2), 1);
    assert_eq!(node.scope.members(&group("g1")), vec![(m2, json!(2))]);
}
