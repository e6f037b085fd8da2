// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::adapters::{DeathNotice, Liveness};
use herd_core::{MemberRef, MonitorRef};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

struct Subscription {
    member: MemberRef,
    sink: mpsc::UnboundedSender<DeathNotice>,
}

#[derive(Default)]
struct LivenessInner {
    /// Death reason per known member; `None` while alive.
    members: HashMap<MemberRef, Option<String>>,
    subscriptions: HashMap<MonitorRef, Subscription>,
}

/// Cluster-wide fake liveness primitive with an explicit kill switch.
///
/// Share one instance across every node of a test cluster; monitoring is
/// not node-local (multi-call workers subscribe to remote members too).
#[derive(Clone, Default)]
pub struct FakeLiveness {
    inner: Arc<Mutex<LivenessInner>>,
}

impl FakeLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a member alive. Must be called before the member can join.
    pub fn register(&self, member: &MemberRef) {
        self.inner.lock().members.insert(member.clone(), None);
    }

    /// Kill a member: every live subscription on it gets exactly one
    /// notice carrying `reason`.
    pub fn kill(&self, member: &MemberRef, reason: &str) {
        let mut inner = self.inner.lock();
        inner.members.insert(member.clone(), Some(reason.to_string()));
        let doomed: Vec<MonitorRef> = inner
            .subscriptions
            .iter()
            .filter(|(_, sub)| &sub.member == member)
            .map(|(monitor, _)| monitor.clone())
            .collect();
        for monitor in doomed {
            if let Some(sub) = inner.subscriptions.remove(&monitor) {
                let _ = sub.sink.send(DeathNotice {
                    monitor,
                    member: member.clone(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    /// Number of live subscriptions on `member`.
    pub fn subscription_count(&self, member: &MemberRef) -> usize {
        self.inner.lock().subscriptions.values().filter(|sub| &sub.member == member).count()
    }
}

impl Liveness for FakeLiveness {
    fn is_alive(&self, member: &MemberRef) -> bool {
        matches!(self.inner.lock().members.get(member), Some(None))
    }

    fn subscribe(
        &self,
        member: &MemberRef,
        sink: mpsc::UnboundedSender<DeathNotice>,
    ) -> MonitorRef {
        let monitor = MonitorRef::mint();
        let mut inner = self.inner.lock();
        let status = inner.members.get(member).cloned();
        match status {
            // Subscribing to a dead (or never-registered) member fires
            // immediately, like monitoring an exited task.
            Some(Some(reason)) => {
                let _ = sink.send(DeathNotice {
                    monitor: monitor.clone(),
                    member: member.clone(),
                    reason,
                });
            }
            None => {
                let _ = sink.send(DeathNotice {
                    monitor: monitor.clone(),
                    member: member.clone(),
                    reason: "noproc".to_string(),
                });
            }
            Some(None) => {
                inner
                    .subscriptions
                    .insert(monitor.clone(), Subscription { member: member.clone(), sink });
            }
        }
        monitor
    }

    fn unsubscribe(&self, monitor: &MonitorRef) {
        self.inner.lock().subscriptions.remove(monitor);
    }
}
