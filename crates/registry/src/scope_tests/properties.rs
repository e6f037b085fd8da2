// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generated-sequence sweeps over the scope engine, checked against a
//! flat model of expected membership and callbacks after every step.

use super::*;
use crate::adapters::fake::CallbackKind;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;

const GROUPS: [&str; 3] = ["g0", "g1", "g2"];
const MEMBERS: usize = 3;

#[derive(Debug, Clone)]
enum EngineOp {
    Join { member: usize, group: usize, meta: u64 },
    Leave { member: usize, group: usize },
    Kill { member: usize },
}

fn engine_op() -> impl Strategy<Value = EngineOp> {
    prop_oneof![
        4 => (0..MEMBERS, 0..GROUPS.len(), 0u64..3)
            .prop_map(|(member, group, meta)| EngineOp::Join { member, group, meta }),
        2 => (0..MEMBERS, 0..GROUPS.len())
            .prop_map(|(member, group)| EngineOp::Leave { member, group }),
        1 => (0..MEMBERS).prop_map(|member| EngineOp::Kill { member }),
    ]
}

/// What the engine should have done so far: live membership plus the
/// exact number of each callback kind.
struct Model {
    entries: HashMap<(usize, usize), u64>,
    alive: Vec<bool>,
    joined: usize,
    updated: usize,
    left: usize,
}

impl Model {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            alive: vec![true; MEMBERS],
            joined: 0,
            updated: 0,
            left: 0,
        }
    }

    fn apply(&mut self, op: &EngineOp) {
        match *op {
            EngineOp::Join { member, group, meta } => {
                if !self.alive[member] {
                    return;
                }
                match self.entries.get(&(group, member)) {
                    Some(current) if *current == meta => {}
                    Some(_) => {
                        self.entries.insert((group, member), meta);
                        self.updated += 1;
                    }
                    None => {
                        self.entries.insert((group, member), meta);
                        self.joined += 1;
                    }
                }
            }
            EngineOp::Leave { member, group } => {
                if self.entries.remove(&(group, member)).is_some() {
                    self.left += 1;
                }
            }
            EngineOp::Kill { member } => {
                if !self.alive[member] {
                    return;
                }
                self.alive[member] = false;
                let doomed: Vec<(usize, usize)> = self
                    .entries
                    .keys()
                    .filter(|(_, m)| *m == member)
                    .copied()
                    .collect();
                for key in doomed {
                    self.entries.remove(&key);
                    self.left += 1;
                }
            }
        }
    }

    fn member_present(&self, member: usize) -> bool {
        self.entries.keys().any(|(_, m)| *m == member)
    }
}

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

// Monitor refcount: one subscription per locally present member, zero
// once its last entry is gone, after every step of any op sequence.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn monitor_count_tracks_local_membership(
        ops in proptest::collection::vec(engine_op(), 1..30)
    ) {
        test_runtime().block_on(async {
            let cluster = TestCluster::new();
            let node = cluster.start_node("a");
            let members: Vec<_> = (0..MEMBERS).map(|_| cluster.spawn_member("a")).collect();
            let mut model = Model::new();

            for op in &ops {
                run_op(&cluster, &node, &members, op).await;
                model.apply(op);
                for (index, member) in members.iter().enumerate() {
                    assert_eq!(
                        cluster.liveness.subscription_count(member),
                        usize::from(model.member_present(index)),
                        "monitor count diverged after {:?}",
                        op,
                    );
                }
            }
        });
    }
}

// Exactly one callback per observable transition: the recorded callback
// counts match the model's transition counts after every step, so none
// is skipped and none fires twice.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn one_callback_per_observable_transition(
        ops in proptest::collection::vec(engine_op(), 1..30)
    ) {
        test_runtime().block_on(async {
            let cluster = TestCluster::new();
            let node = cluster.start_node("a");
            let members: Vec<_> = (0..MEMBERS).map(|_| cluster.spawn_member("a")).collect();
            let mut model = Model::new();

            for op in &ops {
                run_op(&cluster, &node, &members, op).await;
                model.apply(op);
                assert_eq!(node.handler.count(CallbackKind::Joined), model.joined);
                assert_eq!(node.handler.count(CallbackKind::Updated), model.updated);
                assert_eq!(node.handler.count(CallbackKind::Left), model.left);
            }
        });
    }
}

async fn run_op(
    cluster: &TestCluster,
    node: &TestNode,
    members: &[herd_core::MemberRef],
    op: &EngineOp,
) {
    match *op {
        EngineOp::Join { member, group: g, meta } => {
            let _ = node.scope.join(group(GROUPS[g]), members[member].clone(), json!(meta)).await;
        }
        EngineOp::Leave { member, group: g } => {
            let _ = node.scope.leave(group(GROUPS[g]), members[member].clone()).await;
        }
        EngineOp::Kill { member } => {
            cluster.liveness.kill(&members[member], "chaos");
        }
    }
    node.scope.flush().await.unwrap();
}
