// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herd_core::{Entry, GroupName, MemberRef, MonitorRef, NodeId, TaskId};
use proptest::prelude::*;
use serde_json::json;

fn member(node: &str, task: &str) -> MemberRef {
    MemberRef::new(NodeId::new(node), TaskId::from_string(task))
}

fn entry(group: &str, m: &MemberRef, meta: serde_json::Value, stamp: u64) -> Entry {
    Entry {
        group: GroupName::new(group),
        member: m.clone(),
        meta,
        stamp,
        monitor: None,
        owner: m.node().clone(),
    }
}

#[test]
fn insert_is_visible_in_both_indexes() {
    let mut store = ScopeStore::new();
    let m = member("a", "t1");
    store.insert(entry("g", &m, json!(1), 10));
    assert!(store.contains(&GroupName::new("g"), &m));
    assert_eq!(store.groups_of(&m).len(), 1);
    assert!(store.indexes_symmetric());
}

#[test]
fn remove_clears_both_indexes_and_empty_group() {
    let mut store = ScopeStore::new();
    let m = member("a", "t1");
    store.insert(entry("g", &m, json!(1), 10));
    let removed = store.remove(&GroupName::new("g"), &m).unwrap();
    assert_eq!(removed.stamp, 10);
    assert!(store.is_empty());
    assert!(store.group_names().is_empty());
    assert!(!store.has_entries_for(&m));
}

#[test]
fn remove_absent_returns_none() {
    let mut store = ScopeStore::new();
    assert!(store.remove(&GroupName::new("g"), &member("a", "t1")).is_none());
}

#[test]
fn group_vanishes_only_when_last_member_leaves() {
    let mut store = ScopeStore::new();
    let m1 = member("a", "t1");
    let m2 = member("a", "t2");
    let g = GroupName::new("g");
    store.insert(entry("g", &m1, json!(1), 10));
    store.insert(entry("g", &m2, json!(2), 11));
    store.remove(&g, &m1);
    assert_eq!(store.group_names(), vec![g.clone()]);
    store.remove(&g, &m2);
    assert!(store.group_names().is_empty());
}

#[test]
fn merge_remote_inserts_when_absent() {
    let mut store = ScopeStore::new();
    let m = member("b", "t1");
    let merge = store.merge_remote(GroupName::new("g"), m.clone(), json!("v1"), 100);
    assert_eq!(merge, Merge::Inserted);
    let stored = store.get(&GroupName::new("g"), &m).unwrap();
    assert_eq!(stored.monitor, None);
    assert_eq!(stored.owner, NodeId::new("b"));
}

#[test]
fn merge_remote_drops_stale_and_equal_stamps() {
    let mut store = ScopeStore::new();
    let m = member("b", "t1");
    let g = GroupName::new("g");
    store.merge_remote(g.clone(), m.clone(), json!("v1"), 100);
    assert_eq!(store.merge_remote(g.clone(), m.clone(), json!("old"), 50), Merge::Stale);
    assert_eq!(store.merge_remote(g.clone(), m.clone(), json!("tie"), 100), Merge::Stale);
    assert_eq!(store.get(&g, &m).unwrap().meta, json!("v1"));
}

#[test]
fn merge_remote_reports_meta_change() {
    let mut store = ScopeStore::new();
    let m = member("b", "t1");
    let g = GroupName::new("g");
    store.merge_remote(g.clone(), m.clone(), json!("v1"), 100);
    assert_eq!(
        store.merge_remote(g.clone(), m.clone(), json!("v2"), 101),
        Merge::Replaced { meta_changed: true }
    );
    assert_eq!(
        store.merge_remote(g.clone(), m.clone(), json!("v2"), 102),
        Merge::Replaced { meta_changed: false }
    );
}

#[test]
fn owner_selections_split_local_and_remote() {
    let mut store = ScopeStore::new();
    let local = member("a", "t1");
    let remote = member("b", "t2");
    let g = GroupName::new("g");
    store.insert(entry("g", &local, json!(1), 10));
    store.insert(entry("g", &remote, json!(2), 11));

    let node_a = NodeId::new("a");
    assert_eq!(store.members(&g).len(), 2);
    assert_eq!(store.members_owned_by(&g, &node_a), vec![(local.clone(), json!(1))]);
    assert_eq!(store.member_count(&g), 2);
    assert_eq!(store.member_count_owned_by(&g, &node_a), 1);

    let snapshot = store.snapshot_owned_by(&node_a);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].member, local);
}

#[test]
fn group_names_on_reports_hosting_node() {
    let mut store = ScopeStore::new();
    store.insert(entry("g1", &member("a", "t1"), json!(1), 10));
    store.insert(entry("g2", &member("b", "t2"), json!(2), 11));
    assert_eq!(store.group_names_on(&NodeId::new("a")), vec![GroupName::new("g1")]);
    assert_eq!(store.group_names().len(), 2);
}

#[test]
fn purge_owned_by_removes_only_that_node() {
    let mut store = ScopeStore::new();
    store.insert(entry("g1", &member("b", "t1"), json!(1), 10));
    store.insert(entry("g2", &member("b", "t1"), json!(1), 11));
    store.insert(entry("g1", &member("a", "t2"), json!(2), 12));

    let purged = store.purge_owned_by(&NodeId::new("b"));
    assert_eq!(purged.len(), 2);
    assert_eq!(store.len(), 1);
    assert!(store.indexes_symmetric());
}

#[test]
fn purge_remote_keeps_local_entries() {
    let mut store = ScopeStore::new();
    store.insert(entry("g1", &member("a", "t1"), json!(1), 10));
    store.insert(entry("g1", &member("b", "t2"), json!(2), 11));
    store.insert(entry("g2", &member("c", "t3"), json!(3), 12));

    assert_eq!(store.purge_remote(&NodeId::new("a")), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.members_owned_overall(&NodeId::new("a")).len(), 1);
}

// Index symmetry must survive any interleaving of writes and deletes.
proptest! {
    #[test]
    fn indexes_stay_symmetric(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let mut store = ScopeStore::new();
        for op in ops {
            match op {
                Op::Insert { group, task, stamp } => {
                    let m = member("a", &task);
                    store.insert(entry(&group, &m, json!(stamp), stamp));
                }
                Op::Remove { group, task } => {
                    store.remove(&GroupName::new(&group), &member("a", &task));
                }
                Op::Merge { group, task, stamp } => {
                    store.merge_remote(
                        GroupName::new(&group),
                        member("b", &task),
                        json!(stamp),
                        stamp,
                    );
                }
            }
            prop_assert!(store.indexes_symmetric());
        }
    }
}

// Monitor references stay on the local side of the ownership split: a
// merged remote tuple never carries one (not even when it overwrites an
// earlier merge), and a local write keeps the one it was given.
proptest! {
    #[test]
    fn remote_entries_never_hold_monitors(
        ops in proptest::collection::vec(op_strategy(), 0..60)
    ) {
        let local = NodeId::new("a");
        let mut store = ScopeStore::new();
        for op in ops {
            match op {
                Op::Insert { group, task, stamp } => {
                    let m = member("a", &task);
                    let mut e = entry(&group, &m, json!(stamp), stamp);
                    e.monitor = Some(MonitorRef::mint());
                    store.insert(e);
                }
                Op::Remove { group, task } => {
                    store.remove(&GroupName::new(&group), &member("a", &task));
                }
                Op::Merge { group, task, stamp } => {
                    store.merge_remote(
                        GroupName::new(&group),
                        member("b", &task),
                        json!(stamp),
                        stamp,
                    );
                }
            }
            for g in store.group_names() {
                for (m, _) in store.members(&g) {
                    let stored = store.get(&g, &m).unwrap();
                    if stored.is_local(&local) {
                        prop_assert!(stored.monitor.is_some());
                    } else {
                        prop_assert!(stored.monitor.is_none());
                    }
                }
            }
        }
    }
}

// Replaying the same joins in any order converges: largest stamp wins
// pairwise, and stamps for one pair never tie.
proptest! {
    #[test]
    fn lww_join_replay_is_order_independent(
        (ordered, shuffled) in join_replay_strategy()
    ) {
        let mut store1 = ScopeStore::new();
        let mut store2 = ScopeStore::new();
        for (group, task, meta, stamp) in &ordered {
            store1.merge_remote(
                GroupName::new(group),
                member("b", task),
                json!(meta),
                *stamp,
            );
        }
        for (group, task, meta, stamp) in &shuffled {
            store2.merge_remote(
                GroupName::new(group),
                member("b", task),
                json!(meta),
                *stamp,
            );
        }
        for (group, task, _, _) in &ordered {
            let g = GroupName::new(group);
            let m = member("b", task);
            prop_assert_eq!(store1.get(&g, &m), store2.get(&g, &m));
        }
    }
}

type Join = (String, String, u64, u64);

fn join_replay_strategy() -> impl Strategy<Value = (Vec<Join>, Vec<Join>)> {
    let join = (
        prop::sample::select(vec!["g1", "g2"]),
        prop::sample::select(vec!["t1", "t2", "t3"]),
        0u64..5,
    );
    proptest::collection::vec(join, 1..30)
        .prop_map(|ops| {
            // Globally distinct stamps: one owner task mints them.
            ops.into_iter()
                .enumerate()
                .map(|(i, (g, t, meta))| (g.to_string(), t.to_string(), meta, i as u64 + 1))
                .collect::<Vec<Join>>()
        })
        .prop_flat_map(|ops| {
            let shuffled = Just(ops.clone()).prop_shuffle();
            (Just(ops), shuffled)
        })
}

#[derive(Debug, Clone)]
enum Op {
    Insert { group: String, task: String, stamp: u64 },
    Remove { group: String, task: String },
    Merge { group: String, task: String, stamp: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let group = prop::sample::select(vec!["g1", "g2", "g3"]);
    let task = prop::sample::select(vec!["t1", "t2", "t3", "t4"]);
    prop_oneof![
        (group.clone(), task.clone(), 1u64..100).prop_map(|(g, t, s)| Op::Insert {
            group: g.to_string(),
            task: t.to_string(),
            stamp: s,
        }),
        (group.clone(), task.clone()).prop_map(|(g, t)| Op::Remove {
            group: g.to_string(),
            task: t.to_string(),
        }),
        (group, task, 1u64..100).prop_map(|(g, t, s)| Op::Merge {
            group: g.to_string(),
            task: t.to_string(),
            stamp: s,
        }),
    ]
}
