// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node-level scope directory.
//!
//! Scopes are independent; the registry only maps names to handles so
//! callers address operations by scope name and get `invalid_scope` for
//! names nothing is serving.

use crate::error::ScopeError;
use crate::fanout::MultiCallResult;
use crate::scope::Scope;
use herd_core::{GroupName, MemberRef, Meta, NodeId, ScopeName};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// All scopes this node participates in.
pub struct Registry {
    node: NodeId,
    scopes: RwLock<HashMap<ScopeName, Scope>>,
}

impl Registry {
    pub fn new(node: NodeId) -> Self {
        Self { node, scopes: RwLock::new(HashMap::new()) }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Register a running scope under its name.
    pub fn add_scope(&self, scope: Scope) {
        self.scopes.write().insert(scope.name().clone(), scope);
    }

    /// Handle for a scope, or `invalid_scope`.
    pub fn scope(&self, name: &ScopeName) -> Result<Scope, ScopeError> {
        self.scopes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ScopeError::InvalidScope(name.clone()))
    }

    pub async fn join(
        &self,
        scope: &ScopeName,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
    ) -> Result<(), ScopeError> {
        self.scope(scope)?.join(group, member, meta).await
    }

    pub async fn leave(
        &self,
        scope: &ScopeName,
        group: GroupName,
        member: MemberRef,
    ) -> Result<(), ScopeError> {
        self.scope(scope)?.leave(group, member).await
    }

    pub fn members(
        &self,
        scope: &ScopeName,
        group: &GroupName,
    ) -> Result<Vec<(MemberRef, Meta)>, ScopeError> {
        Ok(self.scope(scope)?.members(group))
    }

    pub fn local_members(
        &self,
        scope: &ScopeName,
        group: &GroupName,
    ) -> Result<Vec<(MemberRef, Meta)>, ScopeError> {
        Ok(self.scope(scope)?.local_members(group))
    }

    pub fn is_member(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
    ) -> Result<bool, ScopeError> {
        Ok(self.scope(scope)?.is_member(group, member))
    }

    pub fn is_local_member(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
    ) -> Result<bool, ScopeError> {
        Ok(self.scope(scope)?.is_local_member(group, member))
    }

    pub fn group_names(&self, scope: &ScopeName) -> Result<Vec<GroupName>, ScopeError> {
        Ok(self.scope(scope)?.group_names())
    }

    pub fn group_names_on(
        &self,
        scope: &ScopeName,
        node: &NodeId,
    ) -> Result<Vec<GroupName>, ScopeError> {
        Ok(self.scope(scope)?.group_names_on(node))
    }

    pub fn count(&self, scope: &ScopeName) -> Result<usize, ScopeError> {
        Ok(self.scope(scope)?.count())
    }

    pub fn count_on(&self, scope: &ScopeName, node: &NodeId) -> Result<usize, ScopeError> {
        Ok(self.scope(scope)?.count_on(node))
    }

    pub fn member_count(
        &self,
        scope: &ScopeName,
        group: &GroupName,
    ) -> Result<usize, ScopeError> {
        Ok(self.scope(scope)?.member_count(group))
    }

    pub fn local_member_count(
        &self,
        scope: &ScopeName,
        group: &GroupName,
    ) -> Result<usize, ScopeError> {
        Ok(self.scope(scope)?.local_member_count(group))
    }

    pub fn publish(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        msg: Value,
    ) -> Result<usize, ScopeError> {
        Ok(self.scope(scope)?.publish(group, msg))
    }

    pub fn local_publish(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        msg: Value,
    ) -> Result<usize, ScopeError> {
        Ok(self.scope(scope)?.local_publish(group, msg))
    }

    pub async fn multi_call(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        msg: Value,
        timeout: Duration,
    ) -> Result<MultiCallResult, ScopeError> {
        Ok(self.scope(scope)?.multi_call(group, msg, timeout).await)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
