//! The client sync loop: one loop drives outbound rate-limited sends
//! and inbound message application. Incoming messages apply
//! immediately (no coalescing), so a remote entity may receive zero,
//! one, or several updates within one render frame; nothing here
//! blocks rendering.

use std::time::Duration;

use thicket_protocol::{ClientMessage, Role, ServerMessage, SessionId, Transform};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use crate::{AttackParams, AvatarLoader, ClientRateLimiter, RemoteEntityReconciler, resolve_attack};

/// The fixed outbound send cadence: 50 ms, i.e. at most 20 Hz.
pub const SEND_INTERVAL: Duration = Duration::from_millis(50);

/// Client-side sync driver.
///
/// The presentation shell feeds it the local transform and every
/// inbound [`ServerMessage`], and pumps [`tick`](Self::tick) from its
/// update loop. Outbound messages go into the channel handed to
/// [`new`](Self::new); whatever owns the socket drains it.
pub struct SyncLoop<L: AvatarLoader> {
    reconciler: RemoteEntityReconciler<L>,
    limiter: ClientRateLimiter,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    ticker: Interval,
    local_id: Option<SessionId>,
    local_role: Role,
    local: Transform,
}

impl<L: AvatarLoader> SyncLoop<L> {
    /// Must be called within a Tokio runtime (the send ticker and the
    /// reconciler's load tasks live on it).
    pub fn new(loader: L, outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
        let mut ticker = tokio::time::interval(SEND_INTERVAL);
        // A stalled frame shouldn't burst-send stale transforms after.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            reconciler: RemoteEntityReconciler::new(loader),
            limiter: ClientRateLimiter::new(),
            outbound,
            ticker,
            local_id: None,
            local_role: Role::default(),
            local: Transform::default(),
        }
    }

    /// Records the local avatar's transform; sent on the next tick if
    /// it changed.
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    pub fn local_session(&self) -> Option<SessionId> {
        self.local_id
    }

    pub fn local_role(&self) -> Role {
        self.local_role
    }

    /// Applies one inbound message to the local mirror. Sync-relevant
    /// messages mutate the reconciler; everything else (chat, errors,
    /// lobby rosters) is the shell's business and ignored here.
    pub fn apply(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::Welcome {
                session_id,
                sessions,
                ..
            } => {
                self.local_id = Some(*session_id);
                for session in sessions {
                    if session.id != *session_id {
                        self.reconciler.observe(session);
                    }
                }
            }
            ServerMessage::SessionJoined { session } => {
                if Some(session.id) != self.local_id {
                    self.reconciler.observe(session);
                }
            }
            ServerMessage::SessionUpdated {
                session_id,
                transform,
            } => {
                self.reconciler.apply_update(*session_id, *transform);
            }
            ServerMessage::SessionLeft { session_id } => {
                self.reconciler.remove(*session_id);
            }
            ServerMessage::GameStarted { assignments, .. } => {
                for assignment in assignments {
                    if Some(assignment.session_id) == self.local_id {
                        self.local_role = assignment.role;
                    } else {
                        self.reconciler.set_role(assignment.session_id, assignment.role);
                    }
                }
            }
            _ => {}
        }
    }

    /// One scheduled tick: waits out the 50 ms cadence, applies any
    /// finished avatar loads, and emits the local transform if it
    /// changed since the last send. Returns whether a send happened.
    pub async fn tick(&mut self) -> bool {
        self.ticker.tick().await;
        self.reconciler.drain_completed();

        if self.limiter.gate(&self.local) {
            let _ = self.outbound.send(ClientMessage::UpdateTransform {
                transform: self.local,
            });
            true
        } else {
            false
        }
    }

    /// Resolves an incoming attack against the local avatar, using this
    /// client's own last-known copy of the attacker's transform.
    /// `None` when the attacker isn't known here (stale reference).
    pub fn attack_hits_me(&self, attacker: SessionId, params: &AttackParams) -> Option<bool> {
        self.reconciler
            .transform_of(attacker)
            .map(|attacker_transform| resolve_attack(&attacker_transform, &self.local, params))
    }

    pub fn reconciler(&self) -> &RemoteEntityReconciler<L> {
        &self.reconciler
    }
}
