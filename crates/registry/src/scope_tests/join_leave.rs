// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::adapters::fake::CallbackKind;
use crate::error::ScopeError;
use serde_json::json;

#[tokio::test]
async fn join_makes_member_visible() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    node.scope.join(group("chat"), member.clone(), json!(1)).await.unwrap();

    assert_eq!(node.scope.members(&group("chat")), vec![(member.clone(), json!(1))]);
    assert!(node.scope.is_member(&group("chat"), &member));
    assert!(node.scope.is_local_member(&group("chat"), &member));
    assert_eq!(node.scope.group_names(), vec![group("chat")]);
    assert_eq!(node.scope.count(), 1);
}

#[tokio::test]
async fn rejoin_with_identical_meta_is_a_noop() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    node.scope.join(group("g"), member.clone(), json!("m")).await.unwrap();
    node.scope.join(group("g"), member.clone(), json!("m")).await.unwrap();

    let records = node.handler.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, CallbackKind::Joined);
}

#[tokio::test]
async fn rejoin_with_new_meta_fires_updated_once() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    node.scope.join(group("g"), member.clone(), json!("m1")).await.unwrap();
    node.scope.join(group("g"), member.clone(), json!("m2")).await.unwrap();

    let kinds: Vec<_> = node.handler.records().into_iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![CallbackKind::Joined, CallbackKind::Updated]);
    assert_eq!(node.scope.members(&group("g")), vec![(member, json!("m2"))]);
}

#[tokio::test]
async fn join_of_dead_member_is_rejected() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");
    cluster.liveness.kill(&member, "crashed");

    let err = node.scope.join(group("g"), member, json!(1)).await.unwrap_err();
    assert!(matches!(err, ScopeError::NotAlive));
    assert!(node.handler.records().is_empty());
}

#[tokio::test]
async fn leave_of_absent_member_is_rejected() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    let err = node.scope.leave(group("g"), member).await.unwrap_err();
    assert!(matches!(err, ScopeError::NotInGroup));
}

#[tokio::test]
async fn leave_fires_left_and_empties_group() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    node.scope.join(group("g"), member.clone(), json!(1)).await.unwrap();
    node.scope.leave(group("g"), member.clone()).await.unwrap();

    let records = node.handler.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].kind, CallbackKind::Left);
    assert!(records[1].reason.is_normal());
    assert!(node.scope.group_names().is_empty());
    assert!(!node.scope.is_member(&group("g"), &member));
}

#[tokio::test]
async fn one_monitor_is_shared_across_groups() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let member = cluster.spawn_member("a");

    for g in ["g1", "g2", "g3"] {
        node.scope.join(group(g), member.clone(), json!(1)).await.unwrap();
    }
    assert_eq!(cluster.liveness.subscription_count(&member), 1);

    node.scope.leave(group("g1"), member.clone()).await.unwrap();
    node.scope.leave(group("g2"), member.clone()).await.unwrap();
    assert_eq!(cluster.liveness.subscription_count(&member), 1);

    node.scope.leave(group("g3"), member.clone()).await.unwrap();
    assert_eq!(cluster.liveness.subscription_count(&member), 0);
}

#[tokio::test]
async fn distinct_members_get_distinct_monitors() {
    let cluster = TestCluster::new();
    let node = cluster.start_node("a");
    let m1 = cluster.spawn_member("a");
    let m2 = cluster.spawn_member("a");

    node.scope.join(group("g"), m1.clone(), json!(1)).await.unwrap();
    node.scope.join(group("g"), m2.clone(), json!(2)).await.unwrap();

    assert_eq!(cluster.liveness.subscription_count(&m1), 1);
    assert_eq!(cluster.liveness.subscription_count(&m2), 1);
    assert_eq!(node.scope.member_count(&group("g")), 2);
}
