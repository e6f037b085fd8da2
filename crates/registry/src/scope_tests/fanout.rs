// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fanout::MemberMessage;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

/// Spawn a task that answers every call on `rx` with `answer`.
fn respond_with(mut rx: mpsc::UnboundedReceiver<MemberMessage>, answer: serde_json::Value) {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let MemberMessage::Call(envelope) = msg {
                envelope.reply(answer.clone());
            }
        }
    });
}

#[tokio::test]
async fn publish_reaches_every_member_inbox() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let (m1, mut rx1) = cluster.mesh.add_member("a");
    let (m2, mut rx2) = cluster.mesh.add_member("a");
    cluster.liveness.register(&m1);
    cluster.liveness.register(&m2);

    a.scope.join(group("g"), m1.clone(), json!(1)).await.unwrap();
    a.scope.join(group("g"), m2.clone(), json!(2)).await.unwrap();

    let count = a.scope.publish(&group("g"), json!({"op": "ping"}));
    assert_eq!(count, 2);
    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await {
            Some(MemberMessage::Publish(msg)) => assert_eq!(msg, json!({"op": "ping"})),
            other => panic!("expected publish, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn local_publish_skips_remote_members() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let b = cluster.start_node("b");
    cluster.mesh.connect("a", "b").await;
    let (local, mut local_rx) = cluster.mesh.add_member("a");
    let (remote, mut remote_rx) = cluster.mesh.add_member("b");
    cluster.liveness.register(&local);
    cluster.liveness.register(&remote);

    a.scope.join(group("g"), local.clone(), json!(1)).await.unwrap();
    b.scope.join(group("g"), remote.clone(), json!(2)).await.unwrap();
    settle(&[&a, &b]).await;

    assert_eq!(a.scope.local_publish(&group("g"), json!("only-local")), 1);
    assert!(matches!(local_rx.recv().await, Some(MemberMessage::Publish(_))));
    assert!(remote_rx.try_recv().is_err());
}

#[tokio::test]
async fn publish_returns_zero_for_empty_group() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    assert_eq!(a.scope.publish(&group("nobody"), json!(1)), 0);
}

#[tokio::test]
async fn multi_call_separates_good_and_bad_targets() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");

    // h1 answers, h3 never answers.
    let (h1, h1_rx) = cluster.mesh.add_member("a");
    let (h3, _h3_rx) = cluster.mesh.add_member("a");
    cluster.liveness.register(&h1);
    cluster.liveness.register(&h3);
    respond_with(h1_rx, json!("ok"));

    a.scope.join(group("g"), h1.clone(), json!("m1")).await.unwrap();
    a.scope.join(group("g"), h3.clone(), json!("m3")).await.unwrap();

    // h2 is a remote member that died without its owner's leave having
    // arrived yet: still in the snapshot, unmonitored locally, and the
    // per-leg subscription fires immediately.
    let (h2, _h2_rx) = cluster.mesh.add_member("b");
    cluster.liveness.register(&h2);
    cluster.liveness.kill(&h2, "gone");
    cluster.mesh.connect("a", "b").await;
    a.scope.handle_broadcast(
        herd_core::NodeId::new("b"),
        herd_wire::Broadcast::SyncJoin {
            group: group("g"),
            member: h2.clone(),
            meta: json!("m2"),
            stamp: 100,
            reason: herd_core::Reason::Normal,
        },
    );
    a.scope.flush().await.unwrap();
    assert_eq!(a.scope.member_count(&group("g")), 3);

    let result =
        a.scope.multi_call(&group("g"), json!("req"), Duration::from_millis(50)).await;

    assert_eq!(result.replies, vec![((h1, json!("m1")), json!("ok"))]);
    let mut bad: Vec<_> = result.bad_replies.clone();
    bad.sort_by(|x, y| x.0.cmp(&y.0));
    let mut expected = vec![(h2, json!("m2")), (h3, json!("m3"))];
    expected.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(bad, expected);
}

#[tokio::test]
async fn multi_call_on_empty_group_returns_immediately() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let result =
        a.scope.multi_call(&group("nobody"), json!(1), Duration::from_millis(10)).await;
    assert!(result.replies.is_empty());
    assert!(result.bad_replies.is_empty());
}

#[tokio::test]
async fn multi_call_reply_carries_the_member_meta() {
    let cluster = TestCluster::new();
    let a = cluster.start_node("a");
    let (m, mut rx) = cluster.mesh.add_member("a");
    cluster.liveness.register(&m);
    a.scope.join(group("g"), m.clone(), json!({"shard": 7})).await.unwrap();

    tokio::spawn(async move {
        if let Some(MemberMessage::Call(envelope)) = rx.recv().await {
            // The envelope exposes the meta the caller snapshotted.
            let shard = envelope.meta["shard"].clone();
            envelope.reply(json!({ "from_shard": shard }));
        }
    });

    let result = a.scope.multi_call(&group("g"), json!("q"), Duration::from_millis(100)).await;
    assert_eq!(result.replies.len(), 1);
    assert_eq!(result.replies[0].1, json!({"from_shard": 7}));
}
