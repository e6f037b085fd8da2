// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-index store for one scope.
//!
//! The same entries held twice: keyed by group for membership iteration,
//! and keyed by member for death-driven purge without a full scan. Both
//! indexes are mutated only through [`ScopeStore::insert`] and
//! [`ScopeStore::remove`], so they cannot drift apart. The store has no
//! locking of its own; the scope task is the single writer and readers
//! take the shared lock around it.

use herd_core::{Entry, GroupName, MemberRef, Meta, NodeId, SnapshotEntry, Stamp};
use std::collections::BTreeMap;

/// Outcome of merging a remote-owned tuple under last-writer-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// No entry existed; the tuple was inserted.
    Inserted,
    /// A newer stamp replaced the stored entry.
    Replaced { meta_changed: bool },
    /// The stored stamp is at least as new; nothing changed.
    Stale,
}

/// In-memory membership state of one scope on one node.
#[derive(Debug, Default)]
pub struct ScopeStore {
    by_group: BTreeMap<GroupName, BTreeMap<MemberRef, Entry>>,
    by_member: BTreeMap<MemberRef, BTreeMap<GroupName, Entry>>,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: &GroupName, member: &MemberRef) -> Option<&Entry> {
        self.by_group.get(group).and_then(|members| members.get(member))
    }

    pub fn contains(&self, group: &GroupName, member: &MemberRef) -> bool {
        self.get(group, member).is_some()
    }

    /// Write an entry to both indexes, replacing any previous entry for
    /// the same `(group, member)`.
    pub fn insert(&mut self, entry: Entry) {
        self.by_member
            .entry(entry.member.clone())
            .or_default()
            .insert(entry.group.clone(), entry.clone());
        self.by_group.entry(entry.group.clone()).or_default().insert(entry.member.clone(), entry);
    }

    /// Delete from both indexes. Empty group/member buckets are dropped so
    /// a group with no members does not exist.
    pub fn remove(&mut self, group: &GroupName, member: &MemberRef) -> Option<Entry> {
        let entry = {
            let members = self.by_group.get_mut(group)?;
            let entry = members.remove(member)?;
            if members.is_empty() {
                self.by_group.remove(group);
            }
            entry
        };
        if let Some(groups) = self.by_member.get_mut(member) {
            groups.remove(group);
            if groups.is_empty() {
                self.by_member.remove(member);
            }
        }
        Some(entry)
    }

    /// Apply a remote-owned tuple under last-writer-wins: the largest
    /// stamp wins, ties keep what is already stored.
    pub fn merge_remote(
        &mut self,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
        stamp: Stamp,
    ) -> Merge {
        let outcome = match self.get(&group, &member) {
            None => Merge::Inserted,
            Some(stored) if stored.stamp < stamp => {
                Merge::Replaced { meta_changed: stored.meta != meta }
            }
            Some(_) => return Merge::Stale,
        };
        let owner = member.node().clone();
        self.insert(Entry { group, member, meta, stamp, monitor: None, owner });
        outcome
    }

    /// All members of a group with their metadata, any owner.
    pub fn members(&self, group: &GroupName) -> Vec<(MemberRef, Meta)> {
        self.by_group
            .get(group)
            .map(|members| {
                members.values().map(|e| (e.member.clone(), e.meta.clone())).collect()
            })
            .unwrap_or_default()
    }

    /// Members of a group owned by `node`.
    pub fn members_owned_by(&self, group: &GroupName, node: &NodeId) -> Vec<(MemberRef, Meta)> {
        self.by_group
            .get(group)
            .map(|members| {
                members
                    .values()
                    .filter(|e| e.is_local(node))
                    .map(|e| (e.member.clone(), e.meta.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn member_count(&self, group: &GroupName) -> usize {
        self.by_group.get(group).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn member_count_owned_by(&self, group: &GroupName, node: &NodeId) -> usize {
        self.by_group
            .get(group)
            .map(|members| members.values().filter(|e| e.is_local(node)).count())
            .unwrap_or(0)
    }

    /// Every entry the given member currently holds.
    pub fn groups_of(&self, member: &MemberRef) -> Vec<Entry> {
        self.by_member
            .get(member)
            .map(|groups| groups.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_entries_for(&self, member: &MemberRef) -> bool {
        self.by_member.contains_key(member)
    }

    /// Existing group names; derived from the index, never stored.
    pub fn group_names(&self) -> Vec<GroupName> {
        self.by_group.keys().cloned().collect()
    }

    /// Group names with at least one member owned by `node`.
    pub fn group_names_on(&self, node: &NodeId) -> Vec<GroupName> {
        self.by_group
            .iter()
            .filter(|(_, members)| members.values().any(|e| e.is_local(node)))
            .map(|(group, _)| group.clone())
            .collect()
    }

    /// Wire projection of every entry owned by `node`; what this node
    /// contributes to anti-entropy.
    pub fn snapshot_owned_by(&self, node: &NodeId) -> Vec<SnapshotEntry> {
        self.by_member
            .values()
            .flat_map(|groups| groups.values())
            .filter(|e| e.is_local(node))
            .map(Entry::to_snapshot)
            .collect()
    }

    /// Remove and return every entry owned by `node` (peer-down purge).
    pub fn purge_owned_by(&mut self, node: &NodeId) -> Vec<Entry> {
        let doomed: Vec<(GroupName, MemberRef)> = self
            .by_group
            .iter()
            .flat_map(|(group, members)| {
                members
                    .values()
                    .filter(|e| e.is_local(node))
                    .map(|e| (group.clone(), e.member.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        doomed
            .into_iter()
            .filter_map(|(group, member)| self.remove(&group, &member))
            .collect()
    }

    /// Remove every entry NOT owned by `node` (restart purge; remote
    /// state is repopulated through anti-entropy).
    pub fn purge_remote(&mut self, node: &NodeId) -> usize {
        let doomed: Vec<(GroupName, MemberRef)> = self
            .by_group
            .iter()
            .flat_map(|(group, members)| {
                members
                    .values()
                    .filter(|e| !e.is_local(node))
                    .map(|e| (group.clone(), e.member.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        let count = doomed.len();
        for (group, member) in doomed {
            self.remove(&group, &member);
        }
        count
    }

    /// Members with at least one entry owned by `node`; the set a restart
    /// must re-monitor.
    pub fn members_owned_overall(&self, node: &NodeId) -> Vec<MemberRef> {
        self.by_member
            .iter()
            .filter(|(member, _)| member.is_owned_by(node))
            .map(|(member, _)| member.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_group.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_group.is_empty()
    }

    /// True when both indexes hold exactly the same tuples.
    pub fn indexes_symmetric(&self) -> bool {
        let mut from_group: Vec<&Entry> =
            self.by_group.values().flat_map(|m| m.values()).collect();
        let mut from_member: Vec<&Entry> =
            self.by_member.values().flat_map(|m| m.values()).collect();
        let key = |e: &&Entry| (e.group.clone(), e.member.clone());
        from_group.sort_by_key(key);
        from_member.sort_by_key(key);
        from_group == from_member
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
