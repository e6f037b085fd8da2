// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two nodes, one group: replication and query visibility.

use crate::harness::{group, scope, settle, Cluster};
use herd_core::NodeId;
use herd_registry::{CallbackKind, ScopeError};
use serde_json::json;

#[tokio::test]
async fn join_on_one_node_is_queryable_on_the_other() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.member("a");

    a.registry.join(&scope(), group("chat"), member.clone(), json!(1)).await.unwrap();
    settle(&[&a, &b]).await;

    assert_eq!(
        b.registry.members(&scope(), &group("chat")).unwrap(),
        vec![(member.clone(), json!(1))]
    );
    assert!(!b.registry.is_local_member(&scope(), &group("chat"), &member).unwrap());
    assert!(a.registry.is_local_member(&scope(), &group("chat"), &member).unwrap());
    assert!(b.registry.local_members(&scope(), &group("chat")).unwrap().is_empty());
}

#[tokio::test]
async fn meta_update_fires_joined_then_updated_on_both_nodes() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.member("a");

    a.registry.join(&scope(), group("g"), member.clone(), json!("m1")).await.unwrap();
    a.registry.join(&scope(), group("g"), member.clone(), json!("m2")).await.unwrap();
    settle(&[&a, &b]).await;

    for node in [&a, &b] {
        let kinds: Vec<_> = node.handler.records().into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![CallbackKind::Joined, CallbackKind::Updated]);
    }
}

#[tokio::test]
async fn mutations_route_to_the_owning_node() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let member = cluster.member("a");

    // Joined via b although a owns the member.
    b.registry.join(&scope(), group("g"), member.clone(), json!(7)).await.unwrap();
    assert!(b.registry.is_member(&scope(), &group("g"), &member).unwrap());

    settle(&[&a, &b]).await;
    assert!(a.registry.is_member(&scope(), &group("g"), &member).unwrap());
    assert_eq!(a.registry.local_member_count(&scope(), &group("g")).unwrap(), 1);

    b.registry.leave(&scope(), group("g"), member.clone()).await.unwrap();
    settle(&[&a, &b]).await;
    assert_eq!(a.registry.count(&scope()).unwrap(), 0);
    assert_eq!(b.registry.count(&scope()).unwrap(), 0);
}

#[tokio::test]
async fn queries_against_a_missing_scope_fail() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let ghost = herd_core::ScopeName::new("ghost");
    assert!(matches!(
        a.registry.group_names(&ghost),
        Err(ScopeError::InvalidScope(name)) if name == ghost
    ));
}

#[tokio::test]
async fn group_names_can_be_restricted_to_a_node() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let on_a = cluster.member("a");
    let on_b = cluster.member("b");

    a.registry.join(&scope(), group("only-a"), on_a, json!(1)).await.unwrap();
    b.registry.join(&scope(), group("only-b"), on_b, json!(2)).await.unwrap();
    settle(&[&a, &b]).await;

    assert_eq!(a.registry.count(&scope()).unwrap(), 2);
    assert_eq!(a.registry.group_names_on(&scope(), &NodeId::new("b")).unwrap(), vec![group("only-b")]);
    assert_eq!(a.registry.count_on(&scope(), &NodeId::new("a")).unwrap(), 1);
}
