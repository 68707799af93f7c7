//! Lobby manager: creates, tracks, and destroys lobbies, and reports
//! the side effects the connection handler must broadcast.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use thicket_protocol::{LobbyId, Role, RoleAssignment, SessionId};
use thicket_registry::Vacancy;

use crate::{Lobby, LobbyError};

/// Counter for generating unique lobby IDs.
static NEXT_LOBBY_ID: AtomicU64 = AtomicU64::new(1);

/// Everything a departure changed, so the caller can notify survivors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub lobby_id: LobbyId,
    /// The lobby hit zero members and was destroyed.
    pub destroyed: bool,
    /// Surviving members in join order.
    pub remaining: Vec<SessionId>,
    /// Set when the departing member was host and the seat moved to the
    /// oldest remaining member. Drives the dedicated host-change
    /// notification, distinct from the roster update.
    pub new_host: Option<SessionId>,
}

/// Outcome of a host kicking a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kicked {
    pub lobby_id: LobbyId,
    pub target: SessionId,
    pub remaining: Vec<SessionId>,
    /// Set in the odd case of a host kicking themself, which migrates
    /// the seat exactly like a leave.
    pub new_host: Option<SessionId>,
}

/// Outcome of a successful game start: the complete role mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedGame {
    pub lobby_id: LobbyId,
    /// One entry per member, exactly one of them Beast. Broadcast whole
    /// to every member.
    pub assignments: Vec<RoleAssignment>,
}

/// The lobby store. Owned by the server state and injected into message
/// handlers; there is no ambient global lobby map.
#[derive(Debug, Default)]
pub struct LobbyManager {
    lobbies: HashMap<LobbyId, Lobby>,

    /// Maps each session to the lobby it's in. A session can be in at
    /// most ONE lobby at a time (key invariant).
    member_index: HashMap<SessionId, LobbyId>,
}

impl LobbyManager {
    pub fn new() -> Self {
        Self {
            lobbies: HashMap::new(),
            member_index: HashMap::new(),
        }
    }

    /// Creates a lobby with `owner` as sole member and host.
    pub fn create(
        &mut self,
        name: &str,
        max_members: usize,
        owner: SessionId,
    ) -> Result<&Lobby, LobbyError> {
        if self.member_index.contains_key(&owner) {
            return Err(LobbyError::AlreadyInLobby(owner));
        }

        let name = name.trim();
        let name = if name.is_empty() { "Untitled Lobby" } else { name };

        let id = LobbyId(NEXT_LOBBY_ID.fetch_add(1, Ordering::Relaxed));
        let lobby = Lobby::new(id, name.to_string(), max_members, owner);
        self.lobbies.insert(id, lobby);
        self.member_index.insert(owner, id);
        tracing::info!(lobby_id = %id, %owner, name, "lobby created");

        Ok(self.lobbies.get(&id).expect("just inserted"))
    }

    /// Adds a session to an existing lobby.
    pub fn join(&mut self, lobby_id: LobbyId, session: SessionId) -> Result<&Lobby, LobbyError> {
        if self.member_index.contains_key(&session) {
            return Err(LobbyError::AlreadyInLobby(session));
        }
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;

        lobby.add_member(session)?;
        self.member_index.insert(session, lobby_id);
        tracing::info!(
            %lobby_id,
            %session,
            members = lobby.member_count(),
            "session joined lobby"
        );
        Ok(self.lobbies.get(&lobby_id).expect("just joined"))
    }

    /// Removes a session from whatever lobby it's in. `None` when the
    /// session was in no lobby — leaving twice is a benign race, not an
    /// error.
    pub fn leave(&mut self, session: SessionId) -> Option<Departure> {
        let lobby_id = self.member_index.remove(&session)?;
        let lobby = self.lobbies.get_mut(&lobby_id)?;

        let vacancy = lobby.remove_member(session);
        let remaining = lobby.members().to_vec();
        let destroyed = remaining.is_empty();
        if destroyed {
            self.lobbies.remove(&lobby_id);
            tracing::info!(%lobby_id, "lobby destroyed (no members left)");
        }

        let new_host = match vacancy {
            Vacancy::Replaced(next) => {
                tracing::info!(%lobby_id, new_host = %next, "lobby host migrated");
                Some(next)
            }
            Vacancy::Unaffected | Vacancy::Dissolved => None,
        };

        Some(Departure {
            lobby_id,
            destroyed,
            remaining,
            new_host,
        })
    }

    /// Removes `target` from the requester's lobby. Host only.
    pub fn kick(&mut self, requester: SessionId, target: SessionId) -> Result<Kicked, LobbyError> {
        let lobby_id = self
            .member_index
            .get(&requester)
            .copied()
            .ok_or(LobbyError::NotAMember(requester))?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;

        if !lobby.is_host(requester) {
            return Err(LobbyError::NotHost(requester));
        }
        if !lobby.is_member(target) {
            return Err(LobbyError::NotAMember(target));
        }

        let vacancy = lobby.remove_member(target);
        self.member_index.remove(&target);
        let remaining = lobby.members().to_vec();
        if remaining.is_empty() {
            // Host kicked themself out of a solo lobby.
            self.lobbies.remove(&lobby_id);
            tracing::info!(%lobby_id, "lobby destroyed (no members left)");
        }
        tracing::info!(%lobby_id, %target, by = %requester, "member kicked");

        Ok(Kicked {
            lobby_id,
            target,
            remaining,
            new_host: match vacancy {
                Vacancy::Replaced(next) => Some(next),
                Vacancy::Unaffected | Vacancy::Dissolved => None,
            },
        })
    }

    /// Starts the requester's lobby: flips it to in-progress and draws
    /// exactly one member as the Beast, uniformly at random.
    ///
    /// The RNG is injected so tests can drive the draw with a seeded
    /// generator; production passes `rand::rng()`.
    pub fn start_game(
        &mut self,
        requester: SessionId,
        rng: &mut impl Rng,
    ) -> Result<StartedGame, LobbyError> {
        let lobby_id = self
            .member_index
            .get(&requester)
            .copied()
            .ok_or(LobbyError::NotAMember(requester))?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;

        if !lobby.is_host(requester) {
            return Err(LobbyError::NotHost(requester));
        }
        if lobby.phase == thicket_protocol::LobbyPhase::InProgress {
            return Err(LobbyError::GameAlreadyStarted(lobby_id));
        }
        if lobby.member_count() < 2 {
            return Err(LobbyError::InsufficientPlayers {
                have: lobby.member_count(),
                need: 2,
            });
        }

        lobby.begin();
        let members = lobby.members();
        let beast_index = rng.random_range(0..members.len());
        let assignments: Vec<RoleAssignment> = members
            .iter()
            .enumerate()
            .map(|(i, &session_id)| RoleAssignment {
                session_id,
                role: if i == beast_index { Role::Beast } else { Role::Human },
            })
            .collect();

        tracing::info!(
            %lobby_id,
            players = assignments.len(),
            beast = %assignments[beast_index].session_id,
            "game started"
        );

        Ok(StartedGame {
            lobby_id,
            assignments,
        })
    }

    /// The lobby a session is currently in, if any.
    pub fn lobby_of(&self, session: SessionId) -> Option<LobbyId> {
        self.member_index.get(&session).copied()
    }

    pub fn get(&self, lobby_id: LobbyId) -> Option<&Lobby> {
        self.lobbies.get(&lobby_id)
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }
}
