//! One lobby's state: ordered membership, phase, and its host election.

use thicket_protocol::{LobbyId, LobbyPhase, SessionId};
use thicket_registry::{HostElection, Vacancy};

use crate::LobbyError;

/// A named, capacity-bounded pre-game grouping of sessions.
///
/// Members are kept in join order — that order *is* the host succession
/// line: when the host leaves, the oldest remaining member takes the
/// seat. The phase only ever moves `Open → InProgress`; a finished
/// lobby is destroyed, never reopened.
#[derive(Debug)]
pub struct Lobby {
    pub id: LobbyId,
    pub name: String,
    pub max_members: usize,
    pub phase: LobbyPhase,
    members: Vec<SessionId>,
    election: HostElection,
}

impl Lobby {
    pub(crate) fn new(id: LobbyId, name: String, max_members: usize, owner: SessionId) -> Self {
        let mut election = HostElection::new();
        election.claim(owner);
        Self {
            id,
            name,
            // A lobby must at least hold its owner.
            max_members: max_members.max(1),
            phase: LobbyPhase::Open,
            members: vec![owner],
            election,
        }
    }

    /// Members in join order (oldest first).
    pub fn members(&self) -> &[SessionId] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn host(&self) -> Option<SessionId> {
        self.election.leader()
    }

    pub fn is_host(&self, id: SessionId) -> bool {
        self.election.is_leader(id)
    }

    pub fn is_member(&self, id: SessionId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members
    }

    /// Validates and appends a joining member.
    pub(crate) fn add_member(&mut self, id: SessionId) -> Result<(), LobbyError> {
        if !self.phase.is_joinable() {
            return Err(LobbyError::GameAlreadyStarted(self.id));
        }
        if self.is_member(id) {
            return Err(LobbyError::AlreadyInLobby(id));
        }
        if self.is_full() {
            return Err(LobbyError::Full(self.id));
        }
        self.members.push(id);
        Ok(())
    }

    /// Removes a member and settles the host seat. Returns the election
    /// outcome; `Vacancy::Unaffected` when the member wasn't host.
    pub(crate) fn remove_member(&mut self, id: SessionId) -> Vacancy {
        self.members.retain(|&m| m != id);
        self.election.vacate(id, self.members.iter().copied())
    }

    /// Flips the phase to in-progress. One-way.
    pub(crate) fn begin(&mut self) {
        self.phase = LobbyPhase::InProgress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(id: u64) -> SessionId {
        SessionId(id)
    }

    #[test]
    fn test_new_lobby_owner_is_sole_member_and_host() {
        let l = Lobby::new(LobbyId(1), "jungle".into(), 4, sid(1));
        assert_eq!(l.members(), &[sid(1)]);
        assert_eq!(l.host(), Some(sid(1)));
        assert_eq!(l.phase, LobbyPhase::Open);
    }

    #[test]
    fn test_max_members_clamped_to_at_least_one() {
        let l = Lobby::new(LobbyId(1), "tiny".into(), 0, sid(1));
        assert_eq!(l.max_members, 1);
        assert!(l.is_full());
    }

    #[test]
    fn test_add_member_rejects_duplicate() {
        let mut l = Lobby::new(LobbyId(1), "jungle".into(), 4, sid(1));
        l.add_member(sid(2)).unwrap();
        assert!(matches!(
            l.add_member(sid(2)),
            Err(LobbyError::AlreadyInLobby(s)) if s == sid(2)
        ));
        assert_eq!(l.member_count(), 2);
    }

    #[test]
    fn test_add_member_rejects_when_full() {
        let mut l = Lobby::new(LobbyId(1), "duo".into(), 2, sid(1));
        l.add_member(sid(2)).unwrap();
        assert!(matches!(l.add_member(sid(3)), Err(LobbyError::Full(_))));
    }

    #[test]
    fn test_add_member_rejects_after_start() {
        let mut l = Lobby::new(LobbyId(1), "jungle".into(), 4, sid(1));
        l.add_member(sid(2)).unwrap();
        l.begin();
        assert!(matches!(
            l.add_member(sid(3)),
            Err(LobbyError::GameAlreadyStarted(_))
        ));
    }

    #[test]
    fn test_remove_host_promotes_oldest_remaining() {
        let mut l = Lobby::new(LobbyId(1), "jungle".into(), 4, sid(1));
        l.add_member(sid(2)).unwrap();
        l.add_member(sid(3)).unwrap();

        let outcome = l.remove_member(sid(1));

        assert_eq!(outcome, Vacancy::Replaced(sid(2)));
        assert_eq!(l.host(), Some(sid(2)));
        assert_eq!(l.members(), &[sid(2), sid(3)]);
    }

    #[test]
    fn test_remove_non_host_keeps_seat() {
        let mut l = Lobby::new(LobbyId(1), "jungle".into(), 4, sid(1));
        l.add_member(sid(2)).unwrap();
        assert_eq!(l.remove_member(sid(2)), Vacancy::Unaffected);
        assert_eq!(l.host(), Some(sid(1)));
    }
}
