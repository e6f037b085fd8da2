// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope handle and runtime task.
//!
//! A [`Scope`] is the cloneable public face of one scope on one node. All
//! mutations funnel into the scope task (one per scope per node), which
//! owns the indexes, the liveness subscriptions, and every peer
//! broadcast. Queries bypass the task and read the shared store under a
//! reader lock.

mod liveness;
mod membership;
mod mutate;
mod replicate;
mod runtime;

use crate::adapters::{DeathNotice, EventHandler, Liveness, Transport};
use crate::error::ScopeError;
use crate::store::ScopeStore;
use herd_core::{Clock, GroupName, MemberRef, Meta, NodeId, RegistryConfig, ScopeName, Stamp};
use herd_core::StampSource;
use herd_wire::{Broadcast, ReplyError, RpcReply, RpcRequest};
use parking_lot::RwLock;
use runtime::ScopeRuntime;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Outcome of a join as decided by the owner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Updated,
    /// Re-join with identical meta; no stamp bump, no callback.
    Noop,
}

/// Adapter bundle a scope runs against.
pub struct ScopeDeps {
    pub transport: Arc<dyn Transport>,
    pub liveness: Arc<dyn Liveness>,
    pub handler: Arc<dyn EventHandler>,
}

/// Work items processed by the scope task.
pub(crate) enum ScopeCommand {
    /// Owner-side join, from this node or a remote requester.
    Join {
        requester: NodeId,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
        reply: oneshot::Sender<Result<(JoinOutcome, Stamp), ScopeError>>,
    },
    /// Owner-side leave; the reply carries the meta the owner observed.
    Leave {
        requester: NodeId,
        group: GroupName,
        member: MemberRef,
        reply: oneshot::Sender<Result<Meta, ScopeError>>,
    },
    /// Caller-side application of a mutation a remote owner acknowledged.
    ApplyJoin {
        group: GroupName,
        member: MemberRef,
        meta: Meta,
        stamp: Stamp,
        reply: oneshot::Sender<()>,
    },
    ApplyLeave {
        group: GroupName,
        member: MemberRef,
        meta: Meta,
        reply: oneshot::Sender<()>,
    },
    /// Replication traffic from a peer.
    Sync { from: NodeId, msg: Broadcast },
    /// Peer membership signals from the scope supervisor.
    PeerUp(NodeId),
    PeerDown(NodeId),
    /// Barrier: acked once everything queued before it has run.
    Flush { reply: oneshot::Sender<()> },
}

/// State shared between the handle and the runtime task.
pub(crate) struct ScopeShared {
    pub(crate) name: ScopeName,
    pub(crate) node: NodeId,
    pub(crate) store: RwLock<ScopeStore>,
    pub(crate) peers: RwLock<BTreeSet<NodeId>>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) liveness: Arc<dyn Liveness>,
    pub(crate) call_timeout: Duration,
}

/// Handle to one scope on one node.
#[derive(Clone)]
pub struct Scope {
    pub(crate) shared: Arc<ScopeShared>,
    pub(crate) cmd_tx: mpsc::Sender<ScopeCommand>,
}

impl Scope {
    /// Start a fresh scope task on this node.
    pub fn spawn<C>(name: ScopeName, config: &RegistryConfig, deps: ScopeDeps, clock: C) -> Scope
    where
        C: Clock + 'static,
    {
        Self::spawn_with_store(name, config, deps, clock, ScopeStore::new())
    }

    /// Re-spawn a scope over indexes that survived a task restart.
    ///
    /// The runtime purges remote-owned entries (their stamps are suspect
    /// after a restart) and rebuilds local monitors before serving.
    pub fn spawn_with_store<C>(
        name: ScopeName,
        config: &RegistryConfig,
        deps: ScopeDeps,
        clock: C,
        store: ScopeStore,
    ) -> Scope
    where
        C: Clock + 'static,
    {
        let highest_local_stamp = store
            .snapshot_owned_by(&config.node)
            .iter()
            .map(|e| e.stamp)
            .max()
            .unwrap_or(0);

        let shared = Arc::new(ScopeShared {
            name,
            node: config.node.clone(),
            store: RwLock::new(store),
            peers: RwLock::new(BTreeSet::new()),
            transport: deps.transport,
            liveness: deps.liveness,
            call_timeout: config.call_timeout(),
        });

        let (cmd_tx, cmd_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (death_tx, death_rx) = mpsc::unbounded_channel::<DeathNotice>();

        let runtime = ScopeRuntime {
            shared: Arc::clone(&shared),
            handler: deps.handler,
            clock,
            stamps: StampSource::resume_from(highest_local_stamp),
            monitors: Default::default(),
            cmd_rx,
            death_rx,
            death_tx,
        };
        tokio::spawn(runtime.run());

        Scope { shared, cmd_tx }
    }

    pub fn name(&self) -> &ScopeName {
        &self.shared.name
    }

    pub fn node(&self) -> &NodeId {
        &self.shared.node
    }

    /// Add a member to a group, attaching `meta`.
    ///
    /// Routed to the member's owning node. On success the mutation is
    /// already visible to reads on this node.
    pub async fn join(
        &self,
        group: GroupName,
        member: MemberRef,
        meta: Meta,
    ) -> Result<(), ScopeError> {
        if member.is_owned_by(&self.shared.node) {
            let (tx, rx) = oneshot::channel();
            self.send(ScopeCommand::Join {
                requester: self.shared.node.clone(),
                group,
                member,
                meta,
                reply: tx,
            })
            .await?;
            rx.await.map_err(|_| ScopeError::Closed)?.map(|_| ())
        } else {
            let owner = member.node().clone();
            let req = RpcRequest::JoinOnNode {
                requester: self.shared.node.clone(),
                group: group.clone(),
                member: member.clone(),
                meta: meta.clone(),
            };
            let reply = self
                .shared
                .transport
                .call(&owner, &self.shared.name, req, self.shared.call_timeout)
                .await?;
            match reply {
                RpcReply::Joined { stamp } | RpcReply::Updated { stamp } => {
                    let (tx, rx) = oneshot::channel();
                    self.send(ScopeCommand::ApplyJoin { group, member, meta, stamp, reply: tx })
                        .await?;
                    rx.await.map_err(|_| ScopeError::Closed)
                }
                RpcReply::Noop => Ok(()),
                RpcReply::Error { kind } => Err(ScopeError::from_reply(kind, &self.shared.name)),
                RpcReply::Left { .. } => Err(ScopeError::BadReply),
            }
        }
    }

    /// Remove a member from a group. Routed like [`Scope::join`].
    pub async fn leave(&self, group: GroupName, member: MemberRef) -> Result<(), ScopeError> {
        if member.is_owned_by(&self.shared.node) {
            let (tx, rx) = oneshot::channel();
            self.send(ScopeCommand::Leave {
                requester: self.shared.node.clone(),
                group,
                member,
                reply: tx,
            })
            .await?;
            rx.await.map_err(|_| ScopeError::Closed)?.map(|_| ())
        } else {
            let owner = member.node().clone();
            let req = RpcRequest::LeaveOnNode {
                requester: self.shared.node.clone(),
                group: group.clone(),
                member: member.clone(),
            };
            let reply = self
                .shared
                .transport
                .call(&owner, &self.shared.name, req, self.shared.call_timeout)
                .await?;
            match reply {
                RpcReply::Left { meta } => {
                    let (tx, rx) = oneshot::channel();
                    self.send(ScopeCommand::ApplyLeave { group, member, meta, reply: tx }).await?;
                    rx.await.map_err(|_| ScopeError::Closed)
                }
                RpcReply::Error { kind } => Err(ScopeError::from_reply(kind, &self.shared.name)),
                _ => Err(ScopeError::BadReply),
            }
        }
    }

    /// Serve an owner-routed RPC that arrived from a peer node.
    ///
    /// Transport implementations call this on the destination node.
    pub async fn handle_rpc(&self, req: RpcRequest) -> RpcReply {
        match req {
            RpcRequest::JoinOnNode { requester, group, member, meta } => {
                let (tx, rx) = oneshot::channel();
                let cmd = ScopeCommand::Join { requester, group, member, meta, reply: tx };
                if self.cmd_tx.send(cmd).await.is_err() {
                    return RpcReply::Error { kind: ReplyError::InvalidScope };
                }
                match rx.await {
                    Ok(Ok((JoinOutcome::Joined, stamp))) => RpcReply::Joined { stamp },
                    Ok(Ok((JoinOutcome::Updated, stamp))) => RpcReply::Updated { stamp },
                    Ok(Ok((JoinOutcome::Noop, _))) => RpcReply::Noop,
                    Ok(Err(ScopeError::NotAlive)) => RpcReply::Error { kind: ReplyError::NotAlive },
                    Ok(Err(_)) | Err(_) => RpcReply::Error { kind: ReplyError::InvalidScope },
                }
            }
            RpcRequest::LeaveOnNode { requester, group, member } => {
                let (tx, rx) = oneshot::channel();
                let cmd = ScopeCommand::Leave { requester, group, member, reply: tx };
                if self.cmd_tx.send(cmd).await.is_err() {
                    return RpcReply::Error { kind: ReplyError::InvalidScope };
                }
                match rx.await {
                    Ok(Ok(meta)) => RpcReply::Left { meta },
                    Ok(Err(ScopeError::NotInGroup)) => {
                        RpcReply::Error { kind: ReplyError::NotInGroup }
                    }
                    Ok(Err(_)) | Err(_) => RpcReply::Error { kind: ReplyError::InvalidScope },
                }
            }
        }
    }

    /// Inject replication traffic received from peer `from`.
    ///
    /// Best-effort: dropped with a warning when the scope queue is full
    /// or the task is gone, which anti-entropy repairs later.
    pub fn handle_broadcast(&self, from: NodeId, msg: Broadcast) {
        if let Err(err) = self.cmd_tx.try_send(ScopeCommand::Sync { from, msg }) {
            tracing::warn!(scope = %self.shared.name, error = %err, "dropping replication message");
        }
    }

    /// Peer entered the peer set (delivered by the scope supervisor).
    pub async fn peer_up(&self, node: NodeId) -> Result<(), ScopeError> {
        self.send(ScopeCommand::PeerUp(node)).await
    }

    /// Peer left the peer set.
    pub async fn peer_down(&self, node: NodeId) -> Result<(), ScopeError> {
        self.send(ScopeCommand::PeerDown(node)).await
    }

    /// Wait until every command queued before this call has been
    /// processed. Deterministic settling point for tests and shutdown.
    pub async fn flush(&self) -> Result<(), ScopeError> {
        let (tx, rx) = oneshot::channel();
        self.send(ScopeCommand::Flush { reply: tx }).await?;
        rx.await.map_err(|_| ScopeError::Closed)
    }

    async fn send(&self, cmd: ScopeCommand) -> Result<(), ScopeError> {
        self.cmd_tx.send(cmd).await.map_err(|_| ScopeError::Closed)
    }
}

#[cfg(test)]
#[path = "../scope_tests/mod.rs"]
mod tests;
