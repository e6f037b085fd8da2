// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Member death cascades.

use crate::harness::{group, scope, settle, Cluster};
use herd_core::Reason;
use herd_registry::CallbackKind;
use serde_json::json;

#[tokio::test]
async fn death_leaves_every_group_on_every_node() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.member("a");

    for g in ["g1", "g2", "g3"] {
        a.registry.join(&scope(), group(g), member.clone(), json!(g)).await.unwrap();
    }
    settle(&[&a, &b]).await;
    a.handler.take();
    b.handler.take();

    cluster.liveness.kill(&member, "oom");
    settle(&[&a, &b]).await;

    for node in [&a, &b] {
        let records = node.handler.records();
        assert_eq!(records.len(), 3);
        let mut groups: Vec<_> = records
            .iter()
            .map(|r| {
                assert_eq!(r.kind, CallbackKind::Left);
                assert_eq!(r.reason, Reason::killed("oom"));
                r.group.clone()
            })
            .collect();
        groups.sort();
        assert_eq!(groups, vec![group("g1"), group("g2"), group("g3")]);
        assert_eq!(node.registry.count(&scope()).unwrap(), 0);
    }
}

#[tokio::test]
async fn death_of_one_member_leaves_the_others_untouched() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let doomed = cluster.member("a");
    let survivor = cluster.member("b");

    a.registry.join(&scope(), group("g"), doomed.clone(), json!(1)).await.unwrap();
    b.registry.join(&scope(), group("g"), survivor.clone(), json!(2)).await.unwrap();
    settle(&[&a, &b]).await;

    cluster.liveness.kill(&doomed, "boom");
    settle(&[&a, &b]).await;

    for node in [&a, &b] {
        assert_eq!(
            node.registry.members(&scope(), &group("g")).unwrap(),
            vec![(survivor.clone(), json!(2))]
        );
    }
}
