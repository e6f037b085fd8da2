// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::adapters::EventHandler;
use herd_core::{GroupName, MemberRef, Meta, Reason, ScopeName};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Joined,
    Updated,
    Left,
}

/// One observed lifecycle callback.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRecord {
    pub kind: CallbackKind,
    pub scope: ScopeName,
    pub group: GroupName,
    pub member: MemberRef,
    pub meta: Meta,
    pub reason: Reason,
}

/// Event handler that records every callback in arrival order.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    records: Arc<Mutex<Vec<CallbackRecord>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    pub fn records(&self) -> Vec<CallbackRecord> {
        self.records.lock().clone()
    }

    /// Drain the record log.
    pub fn take(&self) -> Vec<CallbackRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn count(&self, kind: CallbackKind) -> usize {
        self.records.lock().iter().filter(|r| r.kind == kind).count()
    }

    /// Records concerning one member, useful for death cascades.
    pub fn for_member(&self, member: &MemberRef) -> Vec<CallbackRecord> {
        self.records.lock().iter().filter(|r| &r.member == member).cloned().collect()
    }

    fn record(
        &self,
        kind: CallbackKind,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.records.lock().push(CallbackRecord {
            kind,
            scope: scope.clone(),
            group: group.clone(),
            member: member.clone(),
            meta: meta.clone(),
            reason: reason.clone(),
        });
    }
}

impl EventHandler for RecordingHandler {
    fn on_process_joined(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.record(CallbackKind::Joined, scope, group, member, meta, reason);
    }

    fn on_process_left(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.record(CallbackKind::Left, scope, group, member, meta, reason);
    }

    fn on_group_process_updated(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    ) {
        self.record(CallbackKind::Updated, scope, group, member, meta, reason);
    }
}
