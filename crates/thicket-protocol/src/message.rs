//! The message catalogue: everything a client can say to the server and
//! everything the server can say back.
//!
//! Both enums are internally tagged (`#[serde(tag = "type")]`), so a chat
//! message travels as `{ "type": "Chat", "message": "hi" }` — the format
//! the browser client dispatches on.
//!
//! Delivery semantics are deliberately minimal: one ordered, reliable,
//! bidirectional channel per connection, no sequence numbers, no acks.
//! Receivers apply messages in arrival order and the last write wins.

use serde::{Deserialize, Serialize};

use crate::{
    LobbyId, LobbySnapshot, Role, RoleAssignment, SessionId, SessionSnapshot,
    Transform,
};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Messages sent by a client.
///
/// `Join` must be the first message on a fresh connection; everything else
/// is only meaningful once the server has created the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// "Here I am." Creates the session and yields a [`ServerMessage::Welcome`].
    Join {
        name: String,
        transform: Transform,
    },

    /// Periodic transform report, capped client-side at 20 Hz. Relayed
    /// verbatim to the sender's peer group; the server performs no
    /// speed or teleport validation — it is not physics-authoritative.
    UpdateTransform { transform: Transform },

    /// Swing at whoever is in front of us. `role` is the sender's own
    /// role stamp; hit resolution happens independently on every
    /// receiving client.
    Attack { role: Role },

    /// Fire-and-forget chat line. Not persisted.
    Chat { message: String },

    /// Create a lobby with the sender as sole member and host.
    CreateLobby {
        name: String,
        max_members: usize,
    },

    /// Join an existing open lobby.
    JoinLobby { lobby_id: LobbyId },

    /// Leave the current lobby, if any.
    LeaveLobby,

    /// Remove a member from the lobby. Host only.
    Kick { target: SessionId },

    /// Flip the lobby to in-progress and draw the Beast. Host only.
    StartGame,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Reply to `Join`: the new session's own identity plus a complete
    /// roster snapshot of every connected session. Always the full list,
    /// never a diff.
    Welcome {
        session_id: SessionId,
        color: String,
        is_host: bool,
        sessions: Vec<SessionSnapshot>,
    },

    /// Incremental add, sent to everyone except the joiner.
    SessionJoined { session: SessionSnapshot },

    /// Transform relay. Zero, one, or several of these may arrive within
    /// a single render frame; receivers apply each immediately.
    SessionUpdated {
        session_id: SessionId,
        transform: Transform,
    },

    /// The session is gone; tear down its proxy.
    SessionLeft { session_id: SessionId },

    /// An attack happened. Each receiver resolves hit/miss locally
    /// against its own last-known copy of the attacker's transform, so
    /// two observers may disagree — accepted, not a bug.
    AttackLaunched {
        attacker_id: SessionId,
        role: Role,
    },

    /// Chat relay.
    Chat {
        sender_id: SessionId,
        sender_name: String,
        message: String,
    },

    /// The global host seat changed hands. Distinct from join/leave
    /// broadcasts because host-gated behavior keys off it specifically.
    HostChanged { session_id: SessionId },

    /// Full lobby roster, sent to every member (including whoever caused
    /// the change) on create, join, leave, and kick.
    LobbyRoster { lobby: LobbySnapshot },

    /// The lobby's host seat moved to the oldest remaining member.
    /// Sent in addition to the roster update; host-gated UI depends on
    /// this signal, not on diffing rosters.
    LobbyHostChanged {
        lobby_id: LobbyId,
        host_id: SessionId,
    },

    /// You were kicked. Only the kicked session receives this; the rest
    /// of the lobby sees a roster update.
    KickedFromLobby { lobby_id: LobbyId },

    /// The game started: the complete id→role mapping, one Beast among
    /// them, delivered identically to every member.
    GameStarted {
        lobby_id: LobbyId,
        assignments: Vec<RoleAssignment>,
    },

    /// A request failed validation. Sent only to the originating client,
    /// never broadcast, never silently dropped.
    Error {
        kind: ErrorKind,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Closed set of client-visible failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requester is not the lobby host.
    NotHost,
    /// The lobby has no free member slots.
    LobbyFull,
    /// No lobby with that id exists.
    LobbyNotFound,
    /// The session is already a member of a lobby.
    AlreadyInLobby,
    /// The lobby's game is already in progress.
    GameAlreadyStarted,
    /// Not enough members to start.
    InsufficientPlayers,
    /// The named session is not a member of the lobby.
    NotAMember,
    /// The message was well-formed but not valid right now
    /// (e.g. a second `Join` on an established connection).
    BadRequest,
}

// =========================================================================
// Tests
// =========================================================================
