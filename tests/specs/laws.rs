// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Algebraic laws over observable behavior.

use crate::harness::{group, scope, settle, Cluster, Node};
use herd_registry::CallbackKind;
use serde_json::json;

#[tokio::test]
async fn joining_twice_with_same_meta_equals_joining_once() {
    // Meta is compared by equality only, whatever its shape.
    let metas = [json!(42), json!("meta"), json!({"weight": 3, "zone": "eu"}), json!(null)];
    for meta in metas {
        let cluster = Cluster::new();
        let a = cluster.node("a");
        let member = cluster.member("a");

        a.registry.join(&scope(), group("g"), member.clone(), meta.clone()).await.unwrap();
        a.registry.join(&scope(), group("g"), member.clone(), meta.clone()).await.unwrap();

        assert_eq!(a.registry.members(&scope(), &group("g")).unwrap(), vec![(member, meta)]);
        assert_eq!(a.handler.records().len(), 1);
    }
}

#[tokio::test]
async fn meta_change_fires_joined_once_then_updated_once() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let member = cluster.member("a");

    a.registry.join(&scope(), group("g"), member.clone(), json!("m1")).await.unwrap();
    a.registry.join(&scope(), group("g"), member.clone(), json!("m2")).await.unwrap();
    a.registry.join(&scope(), group("g"), member.clone(), json!("m2")).await.unwrap();

    assert_eq!(a.handler.count(CallbackKind::Joined), 1);
    assert_eq!(a.handler.count(CallbackKind::Updated), 1);
}

/// Final state and callback shape of a death match an explicit
/// leave-everything, apart from the reason.
#[tokio::test]
async fn death_is_leave_all_with_an_abnormal_reason() {
    let groups = ["g1", "g2"];

    let by_death = {
        let cluster = Cluster::new();
        let a = cluster.node("a");
        let b = cluster.node("b");
        cluster.mesh.connect("a", "b").await;
        let member = cluster.member("a");
        for g in groups {
            a.registry.join(&scope(), group(g), member.clone(), json!(1)).await.unwrap();
        }
        settle(&[&a, &b]).await;
        b.handler.take();
        cluster.liveness.kill(&member, "boom");
        settle(&[&a, &b]).await;
        observed(&b)
    };

    let by_leaves = {
        let cluster = Cluster::new();
        let a = cluster.node("a");
        let b = cluster.node("b");
        cluster.mesh.connect("a", "b").await;
        let member = cluster.member("a");
        for g in groups {
            a.registry.join(&scope(), group(g), member.clone(), json!(1)).await.unwrap();
        }
        settle(&[&a, &b]).await;
        b.handler.take();
        for g in groups {
            a.registry.leave(&scope(), group(g), member.clone()).await.unwrap();
        }
        settle(&[&a, &b]).await;
        observed(&b)
    };

    assert_eq!(by_death.group_names, by_leaves.group_names);
    assert_eq!(by_death.left_groups, by_leaves.left_groups);
    assert!(by_death.reasons.iter().all(|r| !r.is_normal()));
    assert!(by_leaves.reasons.iter().all(herd_core::Reason::is_normal));
}

/// A peer-down converges to the same state as every remote entry being
/// explicitly left.
#[tokio::test]
async fn peer_down_is_bulk_leave_of_that_nodes_entries() {
    let by_peer_down = {
        let cluster = Cluster::new();
        let a = cluster.node("a");
        let b = cluster.node("b");
        cluster.mesh.connect("a", "b").await;
        let on_b1 = cluster.member("b");
        let on_b2 = cluster.member("b");
        b.registry.join(&scope(), group("g1"), on_b1.clone(), json!(1)).await.unwrap();
        b.registry.join(&scope(), group("g2"), on_b2.clone(), json!(2)).await.unwrap();
        settle(&[&a, &b]).await;
        a.handler.take();
        cluster.mesh.disconnect("a", "b").await;
        settle(&[&a, &b]).await;
        observed(&a)
    };

    let by_leaves = {
        let cluster = Cluster::new();
        let a = cluster.node("a");
        let b = cluster.node("b");
        cluster.mesh.connect("a", "b").await;
        let on_b1 = cluster.member("b");
        let on_b2 = cluster.member("b");
        b.registry.join(&scope(), group("g1"), on_b1.clone(), json!(1)).await.unwrap();
        b.registry.join(&scope(), group("g2"), on_b2.clone(), json!(2)).await.unwrap();
        settle(&[&a, &b]).await;
        a.handler.take();
        b.registry.leave(&scope(), group("g1"), on_b1).await.unwrap();
        b.registry.leave(&scope(), group("g2"), on_b2).await.unwrap();
        settle(&[&a, &b]).await;
        observed(&a)
    };

    assert_eq!(by_peer_down.group_names, by_leaves.group_names);
    assert_eq!(by_peer_down.left_groups, by_leaves.left_groups);
}

struct Observed {
    group_names: Vec<herd_core::GroupName>,
    left_groups: Vec<herd_core::GroupName>,
    reasons: Vec<herd_core::Reason>,
}

fn observed(node: &Node) -> Observed {
    let records = node.handler.records();
    let mut left_groups: Vec<_> = records
        .iter()
        .filter(|r| r.kind == CallbackKind::Left)
        .map(|r| r.group.clone())
        .collect();
    left_groups.sort();
    Observed {
        group_names: node.registry.group_names(&scope()).unwrap(),
        left_groups,
        reasons: records.into_iter().map(|r| r.reason).collect(),
    }
}
