// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group fan-out: publish and scatter/gather calls.
//!
//! Publishes are fire-and-forget over a membership snapshot. A
//! `multi_call` spawns one short-lived worker per target so a slow or
//! dead member cannot block the others; total wall time is bounded by the
//! caller's timeout regardless of group size.

use crate::scope::Scope;
use herd_core::{CallToken, GroupName, MemberRef, Meta};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// What lands in a member task's inbox.
#[derive(Debug)]
pub enum MemberMessage {
    /// One-way publish payload.
    Publish(Value),
    /// A scatter/gather leg expecting exactly one reply.
    Call(CallEnvelope),
}

/// Delivered to a member as part of a `multi_call`. Answer with
/// [`CallEnvelope::reply`]; the token correlates the answer with the
/// waiting worker, so late or foreign replies are discarded there.
#[derive(Debug)]
pub struct CallEnvelope {
    token: CallToken,
    pub msg: Value,
    /// This member's own meta, as the caller saw it.
    pub meta: Meta,
    reply_tx: mpsc::UnboundedSender<(CallToken, Value)>,
}

impl CallEnvelope {
    pub fn reply(self, value: Value) {
        let _ = self.reply_tx.send((self.token, value));
    }
}

/// Result of a scatter/gather call: one outcome per snapshot member.
#[derive(Debug, Default)]
pub struct MultiCallResult {
    pub replies: Vec<((MemberRef, Meta), Value)>,
    pub bad_replies: Vec<(MemberRef, Meta)>,
}

enum LegOutcome {
    Reply(MemberRef, Meta, Value),
    Bad(MemberRef, Meta),
}

impl Scope {
    /// Deliver `msg` to every member of the group, fire-and-forget.
    /// Returns the size of the membership snapshot used.
    pub fn publish(&self, group: &GroupName, msg: Value) -> usize {
        self.fan_out(self.members(group), msg)
    }

    /// Like [`Scope::publish`], restricted to members hosted here.
    pub fn local_publish(&self, group: &GroupName, msg: Value) -> usize {
        self.fan_out(self.local_members(group), msg)
    }

    fn fan_out(&self, members: Vec<(MemberRef, Meta)>, msg: Value) -> usize {
        let count = members.len();
        for (member, _) in members {
            if let Err(err) =
                self.shared.transport.deliver(&member, MemberMessage::Publish(msg.clone()))
            {
                tracing::debug!(
                    scope = %self.shared.name,
                    member = %member,
                    error = %err,
                    "publish delivery failed"
                );
            }
        }
        count
    }

    /// Scatter `msg` to every member of the group and gather replies for
    /// up to `timeout`. Members that die, never answer, or cannot be
    /// reached come back in `bad_replies`.
    pub async fn multi_call(
        &self,
        group: &GroupName,
        msg: Value,
        timeout: Duration,
    ) -> MultiCallResult {
        let members = self.members(group);
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();

        let expected = members.len();
        for (member, meta) in members {
            let transport = self.shared.transport.clone();
            let liveness = self.shared.liveness.clone();
            let msg = msg.clone();
            let out_tx = out_tx.clone();
            tokio::spawn(async move {
                let outcome = call_leg(&*transport, &*liveness, member, meta, msg, timeout).await;
                let _ = out_tx.send(outcome);
            });
        }
        drop(out_tx);

        let mut result = MultiCallResult::default();
        let mut seen = 0;
        while seen < expected {
            let Some(outcome) = out_rx.recv().await else { break };
            seen += 1;
            match outcome {
                LegOutcome::Reply(member, meta, value) => {
                    result.replies.push(((member, meta), value));
                }
                LegOutcome::Bad(member, meta) => result.bad_replies.push((member, meta)),
            }
        }
        result
    }
}

/// One call leg: subscribe to the target's liveness, deliver the
/// envelope, then race reply against death against the deadline.
async fn call_leg(
    transport: &dyn crate::adapters::Transport,
    liveness: &dyn crate::adapters::Liveness,
    member: MemberRef,
    meta: Meta,
    msg: Value,
    timeout: Duration,
) -> LegOutcome {
    let token = CallToken::mint();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let (death_tx, mut death_rx) = mpsc::unbounded_channel();

    let monitor = liveness.subscribe(&member, death_tx);
    let envelope =
        CallEnvelope { token: token.clone(), msg, meta: meta.clone(), reply_tx };

    let outcome = if transport.deliver(&member, MemberMessage::Call(envelope)).is_err() {
        LegOutcome::Bad(member.clone(), meta)
    } else {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = &mut deadline => break LegOutcome::Bad(member.clone(), meta),
                _ = death_rx.recv() => break LegOutcome::Bad(member.clone(), meta),
                reply = reply_rx.recv() => match reply {
                    Some((echoed, value)) if echoed == token => {
                        break LegOutcome::Reply(member.clone(), meta, value);
                    }
                    // Token mismatch: a stray answer on a reused channel.
                    Some(_) => continue,
                    None => break LegOutcome::Bad(member.clone(), meta),
                },
            }
        }
    };
    liveness.unsubscribe(&monitor);
    outcome
}
