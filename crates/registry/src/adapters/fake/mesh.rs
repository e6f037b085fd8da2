// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::adapters::{Transport, TransportError};
use crate::fanout::MemberMessage;
use crate::scope::Scope;
use async_trait::async_trait;
use herd_core::{MemberRef, NodeId, ScopeName};
use herd_wire::{Broadcast, Envelope, RpcReply, RpcRequest};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct MeshInner {
    scopes: HashMap<(NodeId, ScopeName), Scope>,
    /// Symmetric connectivity; a node is never linked to itself.
    links: HashMap<NodeId, BTreeSet<NodeId>>,
    inboxes: HashMap<MemberRef, mpsc::UnboundedSender<MemberMessage>>,
}

impl MeshInner {
    fn linked(&self, a: &NodeId, b: &NodeId) -> bool {
        self.links.get(a).is_some_and(|peers| peers.contains(b))
    }
}

/// In-memory cluster fabric.
///
/// Every message crossing the mesh goes through a real wire round trip
/// (encode, version check, decode), so the protocol is exercised on the
/// same paths production traffic would take.
#[derive(Clone, Default)]
pub struct FakeMesh {
    inner: Arc<Mutex<MeshInner>>,
}

impl FakeMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transport facade a node's scopes run against.
    pub fn transport(&self, node: impl Into<NodeId>) -> Arc<MeshTransport> {
        Arc::new(MeshTransport { mesh: self.clone(), node: node.into() })
    }

    /// Make a scope reachable for RPCs and replication traffic.
    pub fn register_scope(&self, scope: &Scope) {
        self.inner
            .lock()
            .scopes
            .insert((scope.node().clone(), scope.name().clone()), scope.clone());
    }

    /// Mint a member hosted on `node` and hand back its inbox.
    pub fn add_member(
        &self,
        node: impl Into<NodeId>,
    ) -> (MemberRef, mpsc::UnboundedReceiver<MemberMessage>) {
        let member = MemberRef::mint(node.into());
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().inboxes.insert(member.clone(), tx);
        (member, rx)
    }

    /// Drop a member's inbox (the task is gone).
    pub fn remove_member(&self, member: &MemberRef) {
        self.inner.lock().inboxes.remove(member);
    }

    /// Link two nodes without delivering peer signals, as when the
    /// supervisor's peer-up is still in flight behind live traffic.
    pub fn link(&self, a: impl Into<NodeId>, b: impl Into<NodeId>) {
        let (a, b) = (a.into(), b.into());
        let mut inner = self.inner.lock();
        inner.links.entry(a.clone()).or_default().insert(b.clone());
        inner.links.entry(b).or_default().insert(a);
    }

    /// Link two nodes and deliver peer-up signals to every scope on both.
    pub async fn connect(&self, a: impl Into<NodeId>, b: impl Into<NodeId>) {
        let (a, b) = (a.into(), b.into());
        self.link(a.clone(), b.clone());
        let (on_a, on_b) = {
            let inner = self.inner.lock();
            (self.scopes_on_locked(&inner, &a), self.scopes_on_locked(&inner, &b))
        };
        for scope in on_a {
            let _ = scope.peer_up(b.clone()).await;
        }
        for scope in on_b {
            let _ = scope.peer_up(a.clone()).await;
        }
    }

    /// Sever two nodes and deliver peer-down signals to both sides.
    pub async fn disconnect(&self, a: impl Into<NodeId>, b: impl Into<NodeId>) {
        let (a, b) = (a.into(), b.into());
        let (on_a, on_b) = {
            let mut inner = self.inner.lock();
            if let Some(peers) = inner.links.get_mut(&a) {
                peers.remove(&b);
            }
            if let Some(peers) = inner.links.get_mut(&b) {
                peers.remove(&a);
            }
            (self.scopes_on_locked(&inner, &a), self.scopes_on_locked(&inner, &b))
        };
        for scope in on_a {
            let _ = scope.peer_down(b.clone()).await;
        }
        for scope in on_b {
            let _ = scope.peer_down(a.clone()).await;
        }
    }

    fn scopes_on_locked(&self, inner: &MeshInner, node: &NodeId) -> Vec<Scope> {
        inner
            .scopes
            .iter()
            .filter(|((n, _), _)| n == node)
            .map(|(_, scope)| scope.clone())
            .collect()
    }
}

/// Per-node [`Transport`] over a [`FakeMesh`].
pub struct MeshTransport {
    mesh: FakeMesh,
    node: NodeId,
}

#[async_trait]
impl Transport for MeshTransport {
    async fn call(
        &self,
        node: &NodeId,
        scope: &ScopeName,
        req: RpcRequest,
        timeout: Duration,
    ) -> Result<RpcReply, TransportError> {
        let bytes = Envelope::new(scope.clone(), req).encode()?;
        let target = {
            let inner = self.mesh.inner.lock();
            if node != &self.node && !inner.linked(&self.node, node) {
                return Err(TransportError::Unreachable(node.clone()));
            }
            inner.scopes.get(&(node.clone(), scope.clone())).cloned()
        };
        let Some(target) = target else {
            return Ok(RpcReply::Error { kind: herd_wire::ReplyError::InvalidScope });
        };

        let request = Envelope::<RpcRequest>::decode(&bytes)?;
        let reply = tokio::time::timeout(timeout, target.handle_rpc(request.body))
            .await
            .map_err(|_| TransportError::Timeout)?;
        let reply_bytes = Envelope::new(scope.clone(), reply).encode()?;
        Ok(Envelope::<RpcReply>::decode(&reply_bytes)?.body)
    }

    fn broadcast(&self, scope: &ScopeName, msg: Broadcast, except: Option<&NodeId>) {
        let bytes = match Envelope::new(scope.clone(), msg).encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "broadcast encode failed");
                return;
            }
        };
        let targets: Vec<Scope> = {
            let inner = self.mesh.inner.lock();
            inner
                .links
                .get(&self.node)
                .map(|peers| {
                    peers
                        .iter()
                        .filter(|peer| except != Some(*peer))
                        .filter_map(|peer| {
                            inner.scopes.get(&(peer.clone(), scope.clone())).cloned()
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        for target in targets {
            match Envelope::<Broadcast>::decode(&bytes) {
                Ok(envelope) => target.handle_broadcast(self.node.clone(), envelope.body),
                Err(err) => tracing::warn!(error = %err, "broadcast decode failed"),
            }
        }
    }

    fn send(&self, node: &NodeId, scope: &ScopeName, msg: Broadcast) {
        let target = {
            let inner = self.mesh.inner.lock();
            if !inner.linked(&self.node, node) {
                return;
            }
            inner.scopes.get(&(node.clone(), scope.clone())).cloned()
        };
        let Some(target) = target else { return };
        let round_trip = Envelope::new(scope.clone(), msg)
            .encode()
            .and_then(|bytes| Envelope::<Broadcast>::decode(&bytes));
        match round_trip {
            Ok(envelope) => target.handle_broadcast(self.node.clone(), envelope.body),
            Err(err) => tracing::warn!(error = %err, "unicast encode failed"),
        }
    }

    fn deliver(&self, member: &MemberRef, msg: MemberMessage) -> Result<(), TransportError> {
        let sender = {
            let inner = self.mesh.inner.lock();
            if member.node() != &self.node && !inner.linked(&self.node, member.node()) {
                return Err(TransportError::Unreachable(member.node().clone()));
            }
            inner.inboxes.get(member).cloned()
        };
        sender
            .ok_or_else(|| TransportError::Undeliverable(member.clone()))?
            .send(msg)
            .map_err(|_| TransportError::Undeliverable(member.clone()))
    }
}
