// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Death-notification handling.

use super::runtime::ScopeRuntime;
use crate::adapters::DeathNotice;
use herd_core::{Clock, Reason};
use herd_wire::Broadcast;

impl<C: Clock> ScopeRuntime<C> {
    /// A locally owned member exited: purge every group membership it
    /// held, tell the handler, and tell the peers. The subscription is
    /// consumed by the notice itself; there is nothing to unsubscribe.
    pub(crate) fn handle_death(&mut self, notice: DeathNotice) {
        let DeathNotice { monitor, member, reason } = notice;

        match self.monitors.get(&member) {
            Some(current) if *current == monitor => {}
            // A notice can still be in flight after the monitor was
            // released (or replaced by a re-join). Not ours anymore.
            _ => {
                tracing::warn!(
                    scope = %self.shared.name,
                    member = %member,
                    "spurious death notification"
                );
                return;
            }
        }
        self.monitors.remove(&member);

        let entries = self.shared.store.read().groups_of(&member);
        if entries.is_empty() {
            tracing::warn!(
                scope = %self.shared.name,
                member = %member,
                "death notification for member with no entries"
            );
            return;
        }

        tracing::info!(
            scope = %self.shared.name,
            member = %member,
            groups = entries.len(),
            reason = %reason,
            "member died, purging memberships"
        );
        let reason = Reason::killed(reason);
        for entry in entries {
            self.shared.store.write().remove(&entry.group, &entry.member);
            self.fire_left(&entry.group, &entry.member, &entry.meta, &reason);
            self.broadcast(
                Broadcast::SyncLeave {
                    group: entry.group,
                    member: entry.member,
                    meta: entry.meta,
                    reason: reason.clone(),
                },
                None,
            );
        }
    }
}
