//! The host election primitive: first claimant is leader, promote on
//! departure.
//!
//! Two instances of this exist at runtime — one global (inside the
//! session registry, the legacy non-lobby path) and one per lobby. The
//! only difference between them is the successor order the caller
//! supplies to [`vacate`](HostElection::vacate): lobbies pass members in
//! join order so the oldest remaining member is promoted; the global
//! path passes whatever order its map iterates in, which is explicitly
//! "an arbitrary surviving session".

use thicket_protocol::SessionId;

/// Outcome of a departure with respect to the host seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vacancy {
    /// The departing session was not the leader; nothing changed.
    Unaffected,
    /// The departing session was the leader and the seat moved.
    Replaced(SessionId),
    /// The departing session was the leader and nobody remains.
    Dissolved,
}

/// First-joiner-is-leader election over some group of sessions.
#[derive(Debug, Clone, Default)]
pub struct HostElection {
    leader: Option<SessionId>,
}

impl HostElection {
    pub fn new() -> Self {
        Self { leader: None }
    }

    /// Offers the seat to `candidate`. Returns `true` if the candidate
    /// took it (the seat was empty), `false` if it was already held.
    pub fn claim(&mut self, candidate: SessionId) -> bool {
        if self.leader.is_none() {
            self.leader = Some(candidate);
            true
        } else {
            false
        }
    }

    /// The current leader, if any.
    pub fn leader(&self) -> Option<SessionId> {
        self.leader
    }

    pub fn is_leader(&self, id: SessionId) -> bool {
        self.leader == Some(id)
    }

    /// Handles `departing` leaving the group. `successors` is the
    /// surviving membership in promotion order; the departing id is
    /// skipped if the caller happens to still include it.
    pub fn vacate(
        &mut self,
        departing: SessionId,
        successors: impl IntoIterator<Item = SessionId>,
    ) -> Vacancy {
        if self.leader != Some(departing) {
            return Vacancy::Unaffected;
        }
        match successors.into_iter().find(|&s| s != departing) {
            Some(next) => {
                self.leader = Some(next);
                Vacancy::Replaced(next)
            }
            None => {
                self.leader = None;
                Vacancy::Dissolved
            }
        }
    }
}
