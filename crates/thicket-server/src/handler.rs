//! Per-connection handler: the join handshake, message relay, and
//! disconnect cleanup.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive `Join` (with a timeout) → register the session
//!   2. Send `Welcome` (full roster), announce `SessionJoined` to others
//!   3. Loop: receive messages → mutate stores → fan out
//!   4. On any exit, a drop guard runs the disconnect pipeline:
//!      lobby leave side effects, host migration, `SessionLeft`

use std::sync::Arc;
use std::time::Duration;

use thicket_lobby::{LobbyError, LobbyManager};
use thicket_protocol::{
    ClientMessage, Codec, ErrorKind, ProtocolError, Role, ServerMessage, SessionId,
    Transform,
};
use thicket_registry::{SessionRegistry, Vacancy};
use thicket_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ThicketError;
use crate::state::{PeerMap, ServerState, lobby_snapshot, next_session_id};

/// How long a fresh connection has to send its `Join`.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that runs the disconnect pipeline when the handler exits,
/// whether the loop broke cleanly, errored, or panicked. `Drop` is
/// synchronous, so the async cleanup runs in a spawned task.
struct SessionGuard {
    session_id: SessionId,
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session_id = self.session_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            teardown_session(state, session_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ThicketError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: the join handshake ---
    let (name, transform) = await_join(&conn, &state).await?;

    let session_id = next_session_id();
    let conn = Arc::new(conn);

    // Outbound path: handlers enqueue, this task drains into the socket.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let writer = tokio::spawn({
        let conn = Arc::clone(&conn);
        let state = Arc::clone(&state);
        async move {
            while let Some(msg) = rx.recv().await {
                let bytes = match state.codec.encode(&msg) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode outbound message");
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        }
    });

    // Register, welcome, announce — one discrete unit under the locks.
    {
        let mut registry = state.registry.lock().await;
        let mut peers = state.peers.lock().await;

        registry.register(session_id, name.trim().to_string(), transform);
        peers.insert(session_id, tx);

        let snapshot = registry.snapshot(session_id).expect("just registered");
        peers.send_to(
            session_id,
            ServerMessage::Welcome {
                session_id,
                color: snapshot.color.clone(),
                is_host: snapshot.is_host,
                sessions: registry.roster(),
            },
        );
        peers.broadcast(
            &registry.ids(),
            Some(session_id),
            &ServerMessage::SessionJoined { session: snapshot },
        );
    }
    tracing::info!(%conn_id, %session_id, name = %name.trim(), "session joined");

    let _guard = SessionGuard {
        session_id,
        state: Arc::clone(&state),
    };

    // --- Step 2: receive loop ---
    //
    // No idle timeout here: the client rate limiter legitimately goes
    // silent while the player stands still, so liveness is left to the
    // WebSocket layer. Malformed frames are skipped, not fatal.
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%session_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%session_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%session_id, error = %e, "undecodable message, skipping");
                continue;
            }
        };

        dispatch(&state, session_id, msg).await;
    }

    writer.abort();
    // _guard drops here → disconnect pipeline fires.
    Ok(())
}

/// Waits for the first message, which must be `Join`.
async fn await_join(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
) -> Result<(String, Transform), ThicketError> {
    let data = match tokio::time::timeout(JOIN_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before join".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(ThicketError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("join timed out".into()).into());
        }
    };

    match state.codec.decode(&data) {
        Ok(ClientMessage::Join { name, transform }) => Ok((name, transform)),
        Ok(_) => {
            send_direct(
                conn,
                state,
                ServerMessage::Error {
                    kind: ErrorKind::BadRequest,
                    message: "first message must be Join".into(),
                },
            )
            .await?;
            Err(ProtocolError::InvalidMessage("first message must be Join".into()).into())
        }
        Err(e) => Err(ThicketError::Protocol(e)),
    }
}

/// Sends a message on the raw connection, bypassing the peer channel.
/// Only used before the session exists.
async fn send_direct(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
    msg: ServerMessage,
) -> Result<(), ThicketError> {
    let bytes = state.codec.encode(&msg)?;
    conn.send(&bytes).await.map_err(ThicketError::Transport)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

async fn dispatch(state: &Arc<ServerState>, sender: SessionId, msg: ClientMessage) {
    match msg {
        ClientMessage::Join { .. } => {
            let peers = state.peers.lock().await;
            peers.send_to(
                sender,
                ServerMessage::Error {
                    kind: ErrorKind::BadRequest,
                    message: "already joined".into(),
                },
            );
        }
        ClientMessage::UpdateTransform { transform } => {
            update_transform(state, sender, transform).await;
        }
        ClientMessage::Attack { role } => relay_attack(state, sender, role).await,
        ClientMessage::Chat { message } => relay_chat(state, sender, message).await,
        ClientMessage::CreateLobby { name, max_members } => {
            create_lobby(state, sender, &name, max_members).await;
        }
        ClientMessage::JoinLobby { lobby_id } => {
            join_lobby(state, sender, lobby_id).await;
        }
        ClientMessage::LeaveLobby => leave_lobby(state, sender).await,
        ClientMessage::Kick { target } => kick(state, sender, target).await,
        ClientMessage::StartGame => start_game(state, sender).await,
    }
}

/// The sender's relay group: its lobby's members when it's in one,
/// otherwise every session outside any lobby (the legacy global room).
fn peer_group(
    registry: &SessionRegistry,
    lobbies: &LobbyManager,
    sender: SessionId,
) -> Vec<SessionId> {
    match lobbies.lobby_of(sender) {
        Some(lobby_id) => lobbies
            .get(lobby_id)
            .map(|l| l.members().to_vec())
            .unwrap_or_default(),
        None => registry.unlobbied(),
    }
}

fn send_error(peers: &PeerMap, to: SessionId, err: &LobbyError) {
    tracing::debug!(%to, error = %err, "rejecting lobby request");
    peers.send_to(
        to,
        ServerMessage::Error {
            kind: err.kind(),
            message: err.to_string(),
        },
    );
}

// ---------------------------------------------------------------------------
// Relay handlers
// ---------------------------------------------------------------------------

async fn update_transform(state: &Arc<ServerState>, sender: SessionId, transform: Transform) {
    let mut registry = state.registry.lock().await;
    let lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    if !registry.contains(sender) {
        return; // update racing a disconnect
    }
    registry.update_transform(sender, transform);

    // Relayed verbatim — no speed or teleport validation, the server is
    // not physics-authoritative.
    let group = peer_group(&registry, &lobbies, sender);
    peers.broadcast(
        &group,
        Some(sender),
        &ServerMessage::SessionUpdated {
            session_id: sender,
            transform,
        },
    );
}

async fn relay_attack(state: &Arc<ServerState>, sender: SessionId, role: Role) {
    let registry = state.registry.lock().await;
    let lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    if !registry.contains(sender) {
        return;
    }
    let group = peer_group(&registry, &lobbies, sender);
    peers.broadcast(
        &group,
        Some(sender),
        &ServerMessage::AttackLaunched {
            attacker_id: sender,
            role,
        },
    );
}

async fn relay_chat(state: &Arc<ServerState>, sender: SessionId, message: String) {
    let message = message.trim().to_string();
    if message.is_empty() {
        return;
    }

    let registry = state.registry.lock().await;
    let lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    let Some(session) = registry.get(sender) else {
        return;
    };
    let group = peer_group(&registry, &lobbies, sender);
    peers.broadcast(
        &group,
        Some(sender),
        &ServerMessage::Chat {
            sender_id: sender,
            sender_name: session.name.clone(),
            message,
        },
    );
}

// ---------------------------------------------------------------------------
// Lobby handlers
// ---------------------------------------------------------------------------

async fn create_lobby(
    state: &Arc<ServerState>,
    sender: SessionId,
    name: &str,
    max_members: usize,
) {
    let mut registry = state.registry.lock().await;
    let mut lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    match lobbies.create(name, max_members, sender) {
        Ok(lobby) => {
            let lobby_id = lobby.id;
            let snapshot = lobby_snapshot(&registry, lobby);
            registry.set_lobby(sender, Some(lobby_id));
            peers.send_to(sender, ServerMessage::LobbyRoster { lobby: snapshot });
        }
        Err(e) => send_error(&peers, sender, &e),
    }
}

async fn join_lobby(
    state: &Arc<ServerState>,
    sender: SessionId,
    lobby_id: thicket_protocol::LobbyId,
) {
    let mut registry = state.registry.lock().await;
    let mut lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    match lobbies.join(lobby_id, sender) {
        Ok(lobby) => {
            let members = lobby.members().to_vec();
            let snapshot = lobby_snapshot(&registry, lobby);
            registry.set_lobby(sender, Some(lobby_id));
            // Full roster to every member, joiner included — deltas are
            // never used, so views cannot diverge.
            peers.broadcast(&members, None, &ServerMessage::LobbyRoster { lobby: snapshot });
        }
        Err(e) => send_error(&peers, sender, &e),
    }
}

async fn leave_lobby(state: &Arc<ServerState>, sender: SessionId) {
    let mut registry = state.registry.lock().await;
    let mut lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    // Leaving while in no lobby is a benign race, not an error.
    let Some(departure) = lobbies.leave(sender) else {
        return;
    };
    registry.set_lobby(sender, None);

    if departure.destroyed {
        return;
    }
    if let Some(host_id) = departure.new_host {
        peers.broadcast(
            &departure.remaining,
            None,
            &ServerMessage::LobbyHostChanged {
                lobby_id: departure.lobby_id,
                host_id,
            },
        );
    }
    if let Some(lobby) = lobbies.get(departure.lobby_id) {
        peers.broadcast(
            &departure.remaining,
            None,
            &ServerMessage::LobbyRoster {
                lobby: lobby_snapshot(&registry, lobby),
            },
        );
    }
}

async fn kick(state: &Arc<ServerState>, sender: SessionId, target: SessionId) {
    let mut registry = state.registry.lock().await;
    let mut lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    match lobbies.kick(sender, target) {
        Ok(kicked) => {
            registry.set_lobby(kicked.target, None);
            // The kicked session gets a dedicated message, not a
            // generic leave.
            peers.send_to(
                kicked.target,
                ServerMessage::KickedFromLobby {
                    lobby_id: kicked.lobby_id,
                },
            );
            if let Some(host_id) = kicked.new_host {
                peers.broadcast(
                    &kicked.remaining,
                    None,
                    &ServerMessage::LobbyHostChanged {
                        lobby_id: kicked.lobby_id,
                        host_id,
                    },
                );
            }
            if let Some(lobby) = lobbies.get(kicked.lobby_id) {
                peers.broadcast(
                    &kicked.remaining,
                    None,
                    &ServerMessage::LobbyRoster {
                        lobby: lobby_snapshot(&registry, lobby),
                    },
                );
            }
        }
        Err(e) => send_error(&peers, sender, &e),
    }
}

async fn start_game(state: &Arc<ServerState>, sender: SessionId) {
    let mut registry = state.registry.lock().await;
    let mut lobbies = state.lobbies.lock().await;
    let peers = state.peers.lock().await;

    match lobbies.start_game(sender, &mut rand::rng()) {
        Ok(started) => {
            for assignment in &started.assignments {
                registry.set_role(assignment.session_id, assignment.role);
            }
            let members: Vec<SessionId> = started
                .assignments
                .iter()
                .map(|a| a.session_id)
                .collect();
            peers.broadcast(
                &members,
                None,
                &ServerMessage::GameStarted {
                    lobby_id: started.lobby_id,
                    assignments: started.assignments,
                },
            );
        }
        Err(e) => send_error(&peers, sender, &e),
    }
}

// ---------------------------------------------------------------------------
// Disconnect pipeline
// ---------------------------------------------------------------------------

/// Runs the full disconnect side-effect chain: peer removal, lobby
/// leave (roster/host-change to survivors), global host migration, and
/// the `SessionLeft` broadcast. Everything happens under the locks in
/// one unit; there is no reconnect grace window.
async fn teardown_session(state: Arc<ServerState>, session_id: SessionId) {
    let mut registry = state.registry.lock().await;
    let mut lobbies = state.lobbies.lock().await;
    let mut peers = state.peers.lock().await;

    peers.remove(session_id);

    if let Some(departure) = lobbies.leave(session_id) {
        if !departure.destroyed {
            if let Some(host_id) = departure.new_host {
                peers.broadcast(
                    &departure.remaining,
                    None,
                    &ServerMessage::LobbyHostChanged {
                        lobby_id: departure.lobby_id,
                        host_id,
                    },
                );
            }
            if let Some(lobby) = lobbies.get(departure.lobby_id) {
                peers.broadcast(
                    &departure.remaining,
                    None,
                    &ServerMessage::LobbyRoster {
                        lobby: lobby_snapshot(&registry, lobby),
                    },
                );
            }
        }
    }

    let out = registry.deregister(session_id);
    if !out.existed {
        return;
    }

    if let Vacancy::Replaced(new_host) = out.host {
        peers.broadcast(
            &registry.ids(),
            None,
            &ServerMessage::HostChanged {
                session_id: new_host,
            },
        );
    }
    peers.broadcast(
        &registry.ids(),
        None,
        &ServerMessage::SessionLeft { session_id },
    );
}
