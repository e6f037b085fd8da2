// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Peer membership transitions and restart recovery.

use super::runtime::ScopeRuntime;
use herd_core::{Clock, NodeId, Reason};
use herd_wire::Broadcast;

impl<C: Clock> ScopeRuntime<C> {
    /// A peer entered the peer set: remember it and push our owned
    /// entries as a snapshot. The peer does the same towards us, which
    /// together realizes the full-state exchange without either scope
    /// task blocking on the other.
    pub(crate) fn handle_peer_up(&mut self, peer: NodeId) {
        if peer == *self.node() {
            tracing::warn!(scope = %self.shared.name, "peer-up signal for self, ignoring");
            return;
        }
        let added = self.shared.peers.write().insert(peer.clone());
        tracing::info!(scope = %self.shared.name, peer = %peer, rejoined = !added, "peer up");

        let entries = self.shared.store.read().snapshot_owned_by(self.node());
        self.shared.transport.send(
            &peer,
            &self.shared.name,
            Broadcast::Snapshot { node: self.node().clone(), entries },
        );
    }

    /// A peer left: forget it and purge everything it owned. Every node
    /// observes the departure on its own, so nothing is broadcast.
    pub(crate) fn handle_peer_down(&mut self, peer: NodeId) {
        if !self.shared.peers.write().remove(&peer) {
            tracing::debug!(scope = %self.shared.name, peer = %peer, "peer-down for unknown peer");
        }
        let purged = self.shared.store.write().purge_owned_by(&peer);
        tracing::info!(
            scope = %self.shared.name,
            peer = %peer,
            purged = purged.len(),
            "peer down"
        );
        let reason = Reason::NodeDown { node: peer };
        for entry in purged {
            self.fire_left(&entry.group, &entry.member, &entry.meta, &reason);
        }
    }

    /// Restart recovery, run once before serving.
    ///
    /// Remote entries are dropped outright; their stamps predate the
    /// restart and anti-entropy repopulates them on the next peer-up.
    /// Local entries are kept but re-monitored; members that died while
    /// the task was down leave with reason `undefined`.
    pub(crate) fn rebuild(&mut self) {
        let purged = self.shared.store.write().purge_remote(self.node());
        if purged > 0 {
            tracing::info!(scope = %self.shared.name, purged, "dropped remote entries on restart");
        }

        let members = self.shared.store.read().members_owned_overall(self.node());
        for member in members {
            if self.shared.liveness.is_alive(&member) {
                let monitor = self.ensure_monitor(&member);
                let entries = self.shared.store.read().groups_of(&member);
                let mut store = self.shared.store.write();
                for mut entry in entries {
                    entry.monitor = Some(monitor.clone());
                    store.insert(entry);
                }
            } else {
                let entries = self.shared.store.read().groups_of(&member);
                for entry in entries {
                    self.shared.store.write().remove(&entry.group, &entry.member);
                    self.fire_left(&entry.group, &entry.member, &entry.meta, &Reason::Undefined);
                }
            }
        }
    }
}
