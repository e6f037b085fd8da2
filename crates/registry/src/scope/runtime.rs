// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scope task event loop.

use super::{ScopeCommand, ScopeShared};
use crate::adapters::{DeathNotice, EventHandler};
use herd_core::{Clock, GroupName, MemberRef, Meta, MonitorRef, NodeId, Reason, StampSource};
use herd_wire::Broadcast;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Owns everything a scope mutates: the shared indexes (via the write
/// lock), the monitor table, and the stamp source. One instance per scope
/// per node, consumed by its task.
pub(crate) struct ScopeRuntime<C: Clock> {
    pub(crate) shared: Arc<ScopeShared>,
    pub(crate) handler: Arc<dyn EventHandler>,
    pub(crate) clock: C,
    pub(crate) stamps: StampSource,
    /// One monitor per locally owned member, shared by all of the
    /// member's entries regardless of how many groups it is in.
    pub(crate) monitors: HashMap<MemberRef, MonitorRef>,
    pub(crate) cmd_rx: mpsc::Receiver<ScopeCommand>,
    pub(crate) death_rx: mpsc::UnboundedReceiver<DeathNotice>,
    pub(crate) death_tx: mpsc::UnboundedSender<DeathNotice>,
}

impl<C: Clock> ScopeRuntime<C> {
    pub(crate) async fn run(mut self) {
        self.rebuild();
        loop {
            // Deaths drain before new commands so a purge is never
            // reordered behind traffic that queued after the exit.
            tokio::select! {
                biased;
                Some(notice) = self.death_rx.recv() => self.handle_death(notice),
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    // All handles dropped; nothing can reach this scope
                    // anymore.
                    None => break,
                },
            }
        }
        tracing::debug!(scope = %self.shared.name, "scope task stopped");
    }

    fn handle_command(&mut self, cmd: ScopeCommand) {
        match cmd {
            ScopeCommand::Join { requester, group, member, meta, reply } => {
                let result = self.local_join(&requester, group, member, meta);
                let _ = reply.send(result);
            }
            ScopeCommand::Leave { requester, group, member, reply } => {
                let result = self.local_leave(&requester, group, member);
                let _ = reply.send(result);
            }
            ScopeCommand::ApplyJoin { group, member, meta, stamp, reply } => {
                self.apply_remote_join(group, member, meta, stamp, Reason::Normal);
                let _ = reply.send(());
            }
            ScopeCommand::ApplyLeave { group, member, meta, reply } => {
                self.apply_remote_leave(group, member, meta, Reason::Normal);
                let _ = reply.send(());
            }
            ScopeCommand::Sync { from, msg } => self.handle_sync(from, msg),
            ScopeCommand::PeerUp(node) => self.handle_peer_up(node),
            ScopeCommand::PeerDown(node) => self.handle_peer_down(node),
            ScopeCommand::Flush { reply } => {
                let _ = reply.send(());
            }
        }
    }

    pub(crate) fn node(&self) -> &NodeId {
        &self.shared.node
    }

    pub(crate) fn peer_known(&self, node: &NodeId) -> bool {
        self.shared.peers.read().contains(node)
    }

    /// Fan a replication message out to the current peer set.
    pub(crate) fn broadcast(&self, msg: Broadcast, except: Option<&NodeId>) {
        self.shared.transport.broadcast(&self.shared.name, msg, except);
    }

    pub(crate) fn fire_joined(
        &self,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.handler.on_process_joined(&self.shared.name, group, member, meta, reason);
    }

    pub(crate) fn fire_left(
        &self,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.handler.on_process_left(&self.shared.name, group, member, meta, reason);
    }

    pub(crate) fn fire_updated(
        &self,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.handler.on_group_process_updated(&self.shared.name, group, member, meta, reason);
    }
}
