// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner-side mutations.
//!
//! Runs only on the scope task of the node owning the member. Assigns
//! stamps, keeps the monitor table in step with the indexes, and
//! broadcasts after the local write succeeds, never before.

use super::runtime::ScopeRuntime;
use super::JoinOutcome;
use crate::error::ScopeError;
use herd_core::{Clock, Entry, GroupName, MemberRef, Meta, MonitorRef, NodeId, Reason, Stamp};
use herd_wire::Broadcast;

impl<C: Clock> ScopeRuntime<C> {
    pub(crate) fn local_join(
        &mut self,
        requester: &NodeId,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
    ) -> Result<(JoinOutcome, Stamp), ScopeError> {
        if !member.is_owned_by(self.node()) {
            tracing::warn!(
                scope = %self.shared.name,
                member = %member,
                "join routed to wrong node"
            );
            return Err(ScopeError::NotAlive);
        }
        if !self.shared.liveness.is_alive(&member) {
            return Err(ScopeError::NotAlive);
        }

        let existing = self.shared.store.read().get(&group, &member).cloned();
        let (outcome, monitor) = match existing {
            Some(entry) if entry.meta == meta => return Ok((JoinOutcome::Noop, entry.stamp)),
            Some(entry) => (JoinOutcome::Updated, entry.monitor),
            None => (JoinOutcome::Joined, Some(self.ensure_monitor(&member))),
        };

        let stamp = self.stamps.next(&self.clock);
        self.shared.store.write().insert(Entry {
            group: group.clone(),
            member: member.clone(),
            meta: meta.clone(),
            stamp,
            monitor,
            owner: self.node().clone(),
        });

        match outcome {
            JoinOutcome::Joined => self.fire_joined(&group, &member, &meta, &Reason::Normal),
            JoinOutcome::Updated => self.fire_updated(&group, &member, &meta, &Reason::Normal),
            JoinOutcome::Noop => {}
        }

        self.broadcast(
            Broadcast::SyncJoin { group, member, meta, stamp, reason: Reason::Normal },
            Some(requester),
        );
        Ok((outcome, stamp))
    }

    pub(crate) fn local_leave(
        &mut self,
        requester: &NodeId,
        group: GroupName,
        member: MemberRef,
    ) -> Result<Meta, ScopeError> {
        if !member.is_owned_by(self.node()) {
            tracing::warn!(
                scope = %self.shared.name,
                member = %member,
                "leave routed to wrong node"
            );
            return Err(ScopeError::NotInGroup);
        }

        let entry = self
            .shared
            .store
            .write()
            .remove(&group, &member)
            .ok_or(ScopeError::NotInGroup)?;
        self.maybe_demonitor(&member);
        self.fire_left(&group, &member, &entry.meta, &Reason::Normal);
        self.broadcast(
            Broadcast::SyncLeave {
                group,
                member,
                meta: entry.meta.clone(),
                reason: Reason::Normal,
            },
            Some(requester),
        );
        Ok(entry.meta)
    }

    /// Monitor for a local member, reused across all of its groups.
    pub(crate) fn ensure_monitor(&mut self, member: &MemberRef) -> MonitorRef {
        if let Some(monitor) = self.monitors.get(member) {
            return monitor.clone();
        }
        let monitor = self.shared.liveness.subscribe(member, self.death_tx.clone());
        self.monitors.insert(member.clone(), monitor.clone());
        monitor
    }

    /// Release the monitor once the last local entry for the member is
    /// gone. Refcounted by presence in the indexes, not by a counter.
    pub(crate) fn maybe_demonitor(&mut self, member: &MemberRef) {
        if self.shared.store.read().has_entries_for(member) {
            return;
        }
        if let Some(monitor) = self.monitors.remove(member) {
            self.shared.liveness.unsubscribe(&monitor);
        }
    }
}
