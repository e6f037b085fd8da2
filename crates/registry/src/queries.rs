// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock-light read surface.
//!
//! Queries never touch the scope task; they take the reader half of the
//! store lock on the calling thread and reflect the eventually-consistent
//! local view. A query may mix pre- and post-states of unrelated entries;
//! individual entries are always seen whole.

use crate::scope::Scope;
use herd_core::{GroupName, MemberRef, Meta, NodeId};

impl Scope {
    /// All members of a group with their metadata, any owner.
    pub fn members(&self, group: &GroupName) -> Vec<(MemberRef, Meta)> {
        self.shared.store.read().members(group)
    }

    /// Members of a group hosted on this node.
    pub fn local_members(&self, group: &GroupName) -> Vec<(MemberRef, Meta)> {
        self.shared.store.read().members_owned_by(group, &self.shared.node)
    }

    pub fn is_member(&self, group: &GroupName, member: &MemberRef) -> bool {
        self.shared.store.read().contains(group, member)
    }

    pub fn is_local_member(&self, group: &GroupName, member: &MemberRef) -> bool {
        member.is_owned_by(&self.shared.node) && self.is_member(group, member)
    }

    /// Names of all non-empty groups. Derived from the index; a group
    /// with no members does not exist.
    pub fn group_names(&self) -> Vec<GroupName> {
        self.shared.store.read().group_names()
    }

    /// Names of groups with at least one member hosted on `node`.
    pub fn group_names_on(&self, node: &NodeId) -> Vec<GroupName> {
        self.shared.store.read().group_names_on(node)
    }

    pub fn count(&self) -> usize {
        self.group_names().len()
    }

    pub fn count_on(&self, node: &NodeId) -> usize {
        self.group_names_on(node).len()
    }

    pub fn member_count(&self, group: &GroupName) -> usize {
        self.shared.store.read().member_count(group)
    }

    pub fn local_member_count(&self, group: &GroupName) -> usize {
        self.shared.store.read().member_count_owned_by(group, &self.shared.node)
    }

    /// Remote nodes currently in this scope's peer set.
    pub fn peers(&self) -> Vec<NodeId> {
        self.shared.peers.read().iter().cloned().collect()
    }
}
