// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scatter/gather over a group.

use crate::harness::{group, scope, settle, Cluster};
use herd_registry::MemberMessage;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn gathers_replies_and_reports_silent_members() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let (fast, mut fast_rx) = cluster.member_with_inbox("a");
    let (silent, _silent_rx) = cluster.member_with_inbox("a");

    a.registry.join(&scope(), group("g"), fast.clone(), json!("m1")).await.unwrap();
    a.registry.join(&scope(), group("g"), silent.clone(), json!("m3")).await.unwrap();

    tokio::spawn(async move {
        while let Some(msg) = fast_rx.recv().await {
            if let MemberMessage::Call(envelope) = msg {
                envelope.reply(json!("ok"));
            }
        }
    });

    let result = a
        .registry
        .multi_call(&scope(), &group("g"), json!("ping"), Duration::from_millis(50))
        .await
        .unwrap();

    assert_eq!(result.replies, vec![((fast, json!("m1")), json!("ok"))]);
    assert_eq!(result.bad_replies, vec![(silent, json!("m3"))]);
}

#[tokio::test]
async fn publish_is_counted_and_delivered() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    let b = cluster.node("b");
    cluster.mesh.connect("a", "b").await;
    let (m1, mut rx1) = cluster.member_with_inbox("a");
    let (m2, mut rx2) = cluster.member_with_inbox("b");

    a.registry.join(&scope(), group("g"), m1.clone(), json!(1)).await.unwrap();
    b.registry.join(&scope(), group("g"), m2.clone(), json!(2)).await.unwrap();
    settle(&[&a, &b]).await;

    // Publishing from a reaches the remote member too.
    assert_eq!(a.registry.publish(&scope(), &group("g"), json!("hello")).unwrap(), 2);
    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await {
            Some(MemberMessage::Publish(msg)) => assert_eq!(msg, json!("hello")),
            other => panic!("expected publish, got {:?}", other),
        }
    }

    // local_publish stays on the calling node.
    assert_eq!(a.registry.local_publish(&scope(), &group("g"), json!("only-a")).unwrap(), 1);
    assert!(matches!(rx1.recv().await, Some(MemberMessage::Publish(_))));
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn timeout_bounds_the_whole_gather() {
    let cluster = Cluster::new();
    let a = cluster.node("a");
    // Five silent members; the gather must still come back promptly.
    let mut members = Vec::new();
    for _ in 0..5 {
        let (m, _rx) = cluster.member_with_inbox("a");
        a.registry.join(&scope(), group("g"), m.clone(), json!(0)).await.unwrap();
        members.push((m, _rx));
    }

    let started = std::time::Instant::now();
    let result = a
        .registry
        .multi_call(&scope(), &group("g"), json!("ping"), Duration::from_millis(40))
        .await
        .unwrap();
    assert!(result.replies.is_empty());
    assert_eq!(result.bad_replies.len(), 5);
    assert!(started.elapsed() < Duration::from_millis(400));
}
