//! Core protocol types for Thicket's wire format.
//!
//! Everything in this module travels on the wire: identifiers, transforms,
//! roles, and the snapshot structures the server hands to clients. The
//! message catalogue itself lives in [`crate::message`].

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected session.
///
/// Newtype over `u64` so a `SessionId` can never be confused with a
/// [`LobbyId`] in a signature. `#[serde(transparent)]` keeps the JSON
/// representation a plain number, which is what the browser client expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// A unique identifier for a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A 3-component vector, used for both positions and Euler rotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A session's spatial state as reported by its client.
///
/// `rotation` is Euler angles in radians. The server never interprets
/// either field — transforms are relayed verbatim and the consistency
/// model is last-write-wins in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The per-lobby gameplay identity, assigned once at game start.
///
/// Exactly one member of a started lobby is the Beast; everyone else is
/// Human. A single closed enum carried on the session record replaces
/// any per-site boolean flags, so two code paths can never disagree
/// about what a session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Human,
    Beast,
}

impl Role {
    pub fn is_beast(&self) -> bool {
        matches!(self, Role::Beast)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => write!(f, "Human"),
            Role::Beast => write!(f, "Beast"),
        }
    }
}

/// One entry of the id→role mapping broadcast at game start.
///
/// The full `Vec<RoleAssignment>` is sent to every member — each client
/// needs every other member's role to render opponents distinctly, not
/// just its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub session_id: SessionId,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Wire-ready view of one session, as it appears in rosters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub name: String,
    pub transform: Transform,
    /// Display color, a CSS hex string assigned from a fixed palette.
    pub color: String,
    pub role: Role,
    /// Whether this session currently holds the global host seat.
    pub is_host: bool,
    pub lobby: Option<LobbyId>,
}

/// Lifecycle phase of a lobby. The transition `Open → InProgress` is
/// one-way for a given lobby instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyPhase {
    Open,
    InProgress,
}

impl LobbyPhase {
    /// Returns `true` if the lobby is still accepting members.
    pub fn is_joinable(&self) -> bool {
        matches!(self, LobbyPhase::Open)
    }
}

impl fmt::Display for LobbyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobbyPhase::Open => write!(f, "Open"),
            LobbyPhase::InProgress => write!(f, "InProgress"),
        }
    }
}

/// One member as listed in a lobby roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyMember {
    pub id: SessionId,
    pub name: String,
}

/// Wire-ready view of one lobby.
///
/// Rosters are always sent complete, never as deltas — every member gets
/// the same full membership list, so views cannot diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub id: LobbyId,
    pub name: String,
    pub host: Option<SessionId>,
    pub phase: LobbyPhase,
    pub max_members: usize,
    /// Members in join order (oldest first).
    pub members: Vec<LobbyMember>,
}

// =========================================================================
// Tests
// =========================================================================
