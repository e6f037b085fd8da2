// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter traits for external collaborators.
//!
//! The engine never talks to the network, the task runtime, or user code
//! directly; it goes through these traits. Production deployments supply
//! real implementations; tests run against the in-memory fakes in
//! [`fake`].

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use crate::fanout::MemberMessage;
use async_trait::async_trait;
use herd_core::{GroupName, MemberRef, Meta, MonitorRef, NodeId, Reason, ScopeName};
use herd_wire::{Broadcast, RpcReply, RpcRequest};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the peer transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("node unreachable: {0}")]
    Unreachable(NodeId),

    #[error("call timed out")]
    Timeout,

    #[error("member inbox gone: {0}")]
    Undeliverable(MemberRef),

    #[error("protocol: {0}")]
    Protocol(#[from] herd_wire::ProtocolError),
}

/// Message-oriented peer transport: reliable while connected, best-effort
/// across partitions, per-node delivery order preserved.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Synchronous RPC to the scope task on `node`, bounded by `timeout`.
    async fn call(
        &self,
        node: &NodeId,
        scope: &ScopeName,
        req: RpcRequest,
        timeout: Duration,
    ) -> Result<RpcReply, TransportError>;

    /// Fan a message out to every connected peer except `except`. No ack.
    fn broadcast(&self, scope: &ScopeName, msg: Broadcast, except: Option<&NodeId>);

    /// One-way unicast to a single peer (anti-entropy snapshot push).
    fn send(&self, node: &NodeId, scope: &ScopeName, msg: Broadcast);

    /// Deliver a message to a member task's inbox, fire-and-forget.
    fn deliver(&self, member: &MemberRef, msg: MemberMessage) -> Result<(), TransportError>;
}

/// One death notification, delivered to the sink a subscription named.
#[derive(Debug, Clone)]
pub struct DeathNotice {
    pub monitor: MonitorRef,
    pub member: MemberRef,
    pub reason: String,
}

/// Task-liveness monitoring.
///
/// A subscription delivers exactly one [`DeathNotice`] to its sink when
/// the target exits (immediately, if the target is already dead).
pub trait Liveness: Send + Sync + 'static {
    fn is_alive(&self, member: &MemberRef) -> bool;

    fn subscribe(
        &self,
        member: &MemberRef,
        sink: mpsc::UnboundedSender<DeathNotice>,
    ) -> MonitorRef;

    /// Idempotent. A notice already in flight for the reference may still
    /// arrive; receivers match on the reference and drop strays.
    fn unsubscribe(&self, monitor: &MonitorRef);
}

/// User-supplied lifecycle callbacks.
///
/// Invoked on the scope task, in the order the local indexes change, once
/// per observable transition. Implementations must not call back into the
/// scope synchronously.
pub trait EventHandler: Send + Sync + 'static {
    fn on_process_joined(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    );

    fn on_process_left(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    );

    fn on_group_process_updated(
        &self,
        scope: &ScopeName,
        group: &GroupName,
        member: &MemberRef,
        meta: &Meta,
        reason: &Reason,
    );
}
