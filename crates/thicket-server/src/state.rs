//! Shared server state and the per-peer fan-out map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use thicket_lobby::LobbyManager;
use thicket_protocol::{
    JsonCodec, LobbyMember, LobbySnapshot, ServerMessage, SessionId,
};
use thicket_registry::SessionRegistry;
use tokio::sync::{Mutex, mpsc};

/// Counter for assigning session IDs. A reconnecting client gets a
/// brand-new id; there is no reconnect grace window.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_session_id() -> SessionId {
    SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Shared state passed to every connection handler task.
///
/// The stores are explicit objects injected through this struct — no
/// handler reaches for ambient globals. Lock acquisition order is
/// always `registry → lobbies → peers`; a handler that holds all the
/// locks it needs for one message processes that message as one
/// discrete unit, which is the whole consistency model.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) lobbies: Mutex<LobbyManager>,
    pub(crate) peers: Mutex<PeerMap>,
    pub(crate) codec: JsonCodec,
    pub(crate) started_at: Instant,
    pub(crate) tunnel_url: Option<String>,
}

impl ServerState {
    pub(crate) fn new(tunnel_url: Option<String>) -> Self {
        Self {
            registry: Mutex::new(SessionRegistry::new()),
            lobbies: Mutex::new(LobbyManager::new()),
            peers: Mutex::new(PeerMap::new()),
            codec: JsonCodec,
            started_at: Instant::now(),
            tunnel_url,
        }
    }
}

/// One outbound channel per connected session. Fan-out is a synchronous
/// enqueue at the moment of the triggering event; each connection's
/// writer task drains its channel into the socket.
#[derive(Default)]
pub(crate) struct PeerMap {
    senders: HashMap<SessionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl PeerMap {
    pub(crate) fn new() -> Self {
        Self {
            senders: HashMap::new(),
        }
    }

    pub(crate) fn insert(
        &mut self,
        id: SessionId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.senders.insert(id, sender);
    }

    pub(crate) fn remove(&mut self, id: SessionId) {
        self.senders.remove(&id);
    }

    /// Sends to a single session. Silently drops if the receiver is
    /// gone (session mid-disconnect) — stale references are no-ops.
    pub(crate) fn send_to(&self, id: SessionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&id) {
            let _ = sender.send(msg);
        }
    }

    /// Sends to every id in `targets` except `except`.
    pub(crate) fn broadcast(
        &self,
        targets: &[SessionId],
        except: Option<SessionId>,
        msg: &ServerMessage,
    ) {
        for &id in targets {
            if Some(id) == except {
                continue;
            }
            self.send_to(id, msg.clone());
        }
    }
}

/// Builds the wire view of a lobby, resolving member names through the
/// registry.
pub(crate) fn lobby_snapshot(
    registry: &SessionRegistry,
    lobby: &thicket_lobby::Lobby,
) -> LobbySnapshot {
    LobbySnapshot {
        id: lobby.id,
        name: lobby.name.clone(),
        host: lobby.host(),
        phase: lobby.phase,
        max_members: lobby.max_members,
        members: lobby
            .members()
            .iter()
            .map(|&id| LobbyMember {
                id,
                name: registry
                    .get(id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
            })
            .collect(),
    }
}
