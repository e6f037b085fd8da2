// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying replication traffic.
//!
//! Incoming `sync:join`s and snapshot tuples go through one
//! last-writer-wins comparator; the eager apply performed by a requester
//! after a routed mutation goes through the same comparator, so a racing
//! broadcast can never double-fire a callback.

use super::runtime::ScopeRuntime;
use crate::store::Merge;
use herd_core::{Clock, GroupName, MemberRef, Meta, NodeId, Reason, SnapshotEntry, Stamp};
use herd_wire::Broadcast;

impl<C: Clock> ScopeRuntime<C> {
    pub(crate) fn handle_sync(&mut self, from: NodeId, msg: Broadcast) {
        match msg {
            Broadcast::SyncJoin { group, member, meta, stamp, reason } => {
                // Cross-event race: the owner dropped out since sending.
                // The peer-down path cleans up or already has; applying
                // now would resurrect state a flapping peer no longer
                // vouches for.
                if !self.peer_known(member.node()) {
                    tracing::debug!(
                        scope = %self.shared.name,
                        member = %member,
                        "dropping sync join, owner not in peer set"
                    );
                    return;
                }
                self.apply_remote_join(group, member, meta, stamp, reason);
            }
            Broadcast::SyncLeave { group, member, meta, reason } => {
                self.apply_remote_leave(group, member, meta, reason);
            }
            Broadcast::Snapshot { node, entries } => self.apply_snapshot(from, node, entries),
        }
    }

    /// Merge a remote-owned tuple under last-writer-wins and fire the
    /// matching callback.
    ///
    /// No peer-set check here: the sync path guards before calling, and
    /// the eager apply of a mutation a remote owner just acknowledged is
    /// unconditional. The reply data makes that apply exact, and the
    /// routed call must be visible to local reads the moment it returns.
    pub(crate) fn apply_remote_join(
        &mut self,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
        stamp: Stamp,
        reason: Reason,
    ) {
        if member.is_owned_by(self.node()) {
            tracing::warn!(
                scope = %self.shared.name,
                member = %member,
                "ignoring replicated join for a member this node owns"
            );
            return;
        }

        let merge =
            self.shared.store.write().merge_remote(group.clone(), member.clone(), meta.clone(), stamp);
        match merge {
            Merge::Inserted => self.fire_joined(&group, &member, &meta, &reason),
            Merge::Replaced { meta_changed: true } => {
                self.fire_updated(&group, &member, &meta, &reason)
            }
            // Only the stamp moved; nothing observable changed.
            Merge::Replaced { meta_changed: false } => {}
            Merge::Stale => {
                tracing::debug!(scope = %self.shared.name, member = %member, stamp, "stale sync join");
            }
        }
    }

    pub(crate) fn apply_remote_leave(
        &mut self,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
        reason: Reason,
    ) {
        if self.shared.store.write().remove(&group, &member).is_none() {
            tracing::debug!(scope = %self.shared.name, member = %member, "sync leave for absent entry");
            return;
        }
        self.fire_left(&group, &member, &meta, &reason);
    }

    fn apply_snapshot(&mut self, from: NodeId, node: NodeId, entries: Vec<SnapshotEntry>) {
        if from != node {
            tracing::warn!(
                scope = %self.shared.name,
                from = %from,
                claimed = %node,
                "snapshot sender does not own the snapshot"
            );
            return;
        }
        // The snapshot can outrun the supervisor's peer-up signal for its
        // sender; a full-state push is itself proof the peer is up.
        if self.shared.peers.write().insert(node.clone()) {
            tracing::debug!(
                scope = %self.shared.name,
                peer = %node,
                "snapshot arrived before peer-up signal, admitting peer"
            );
        }
        tracing::info!(
            scope = %self.shared.name,
            peer = %node,
            entries = entries.len(),
            "applying anti-entropy snapshot"
        );
        for entry in entries {
            if !entry.member.is_owned_by(&node) {
                tracing::warn!(
                    scope = %self.shared.name,
                    member = %entry.member,
                    "snapshot tuple owned by a different node, skipping"
                );
                continue;
            }
            self.apply_remote_join(
                entry.group,
                entry.member,
                entry.meta,
                entry.stamp,
                Reason::NodeUp { node: node.clone() },
            );
        }
    }
}
