// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last-writer-wins conflict resolution under delayed delivery.

use crate::harness::{group, scope, settle, Cluster};
use herd_core::{NodeId, Reason};
use herd_wire::Broadcast;
use serde_json::json;

#[tokio::test]
async fn delayed_older_sync_join_does_not_regress_state() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.member("a");

    a.registry.join(&scope(), group("g"), member.clone(), json!("v1")).await.unwrap();
    settle(&[&a, &b]).await;
    let callbacks_before = b.handler.records().len();

    // A broadcast from before the join finally arrives, out of order.
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

    assert_eq!(
        b.registry.members(&scope(), &group("g")).unwrap(),
        vec![(member, json!("v1"))]
    );
    assert_eq!(b.handler.records().len(), callbacks_before);
}

#[tokio::test]
async fn newer_sync_join_with_same_meta_is_invisible() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.member("a");

    a.registry.join(&scope(), group("g"), member.clone(), json!("v")).await.unwrap();
    settle(&[&a, &b]).await;
    let callbacks_before = b.handler.records().len();

    // Stamp moved but meta did not: no observable transition.
    b.scope.handle_broadcast(
        NodeId::new("a"),
        Broadcast::SyncJoin {
            group: group("g"),
            member: member.clone(),
            meta: json!("v"),
            stamp: u64::MAX,
            reason: Reason::Normal,
        },
    );
    settle(&[&b]).await;
    assert_eq!(b.handler.records().len(), callbacks_before);
}
