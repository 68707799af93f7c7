//! The session registry: every connected client's record, plus the
//! global host election.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself — it uses a plain
//! `HashMap` and is owned by a single locked site in the server state.
//! Each connection event mutates it as one discrete unit, which is the
//! entire consistency story: handlers interleave, entries never race.

use std::collections::HashMap;

use thicket_protocol::{LobbyId, Role, SessionId, SessionSnapshot, Transform};

use crate::{HostElection, Session, Vacancy};

/// What `deregister` observed, so the caller can drive side effects
/// (host-change notification, roster broadcasts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deregistered {
    /// Whether a record actually existed for the id.
    pub existed: bool,
    /// What happened to the global host seat.
    pub host: Vacancy,
}

/// Registry of all connected sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    /// The legacy global election: first session to connect in process
    /// lifetime holds the seat until it disconnects.
    election: HostElection,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            election: HostElection::new(),
        }
    }

    /// Creates a record for a newly joined session and offers it the
    /// global host seat (first joiner takes it).
    pub fn register(&mut self, id: SessionId, name: String, transform: Transform) -> &Session {
        let session = Session::new(id, name, transform);
        let became_host = self.election.claim(id);
        tracing::info!(
            session_id = %id,
            name = %session.name,
            color = session.color,
            became_host,
            "session registered"
        );
        self.sessions.insert(id, session);
        self.sessions.get(&id).expect("just inserted")
    }

    /// Overwrites the stored transform. Unknown ids are a silent no-op —
    /// an update racing a disconnect, not an error.
    pub fn update_transform(&mut self, id: SessionId, transform: Transform) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.transform = transform;
        } else {
            tracing::debug!(session_id = %id, "transform for unknown session, dropped");
        }
    }

    /// Records the session's assigned role. Unknown ids are a no-op.
    pub fn set_role(&mut self, id: SessionId, role: Role) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.role = role;
        }
    }

    /// Records which lobby the session belongs to. Unknown ids are a no-op.
    pub fn set_lobby(&mut self, id: SessionId, lobby: Option<LobbyId>) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.lobby = lobby;
        }
    }

    /// Removes the record and settles the global host seat, promoting an
    /// arbitrary surviving session if the departing one held it.
    pub fn deregister(&mut self, id: SessionId) -> Deregistered {
        let existed = self.sessions.remove(&id).is_some();
        let host = if existed {
            self.election.vacate(id, self.sessions.keys().copied())
        } else {
            Vacancy::Unaffected
        };
        if existed {
            tracing::info!(
                session_id = %id,
                remaining = self.sessions.len(),
                host_outcome = ?host,
                "session deregistered"
            );
        }
        Deregistered { existed, host }
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// The current global host, if any session is connected.
    pub fn global_host(&self) -> Option<SessionId> {
        self.election.leader()
    }

    pub fn is_global_host(&self, id: SessionId) -> bool {
        self.election.is_leader(id)
    }

    /// Wire-ready view of one session.
    pub fn snapshot(&self, id: SessionId) -> Option<SessionSnapshot> {
        self.sessions
            .get(&id)
            .map(|s| s.snapshot(self.election.is_leader(id)))
    }

    /// Complete roster snapshot — always the full list, never a diff.
    pub fn roster(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .values()
            .map(|s| s.snapshot(self.election.is_leader(s.id)))
            .collect()
    }

    /// Ids of all sessions, in arbitrary order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Ids of sessions not currently in any lobby — the legacy global
    /// relay group.
    pub fn unlobbied(&self) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.lobby.is_none())
            .map(|s| s.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_protocol::Vec3;

    fn sid(id: u64) -> SessionId {
        SessionId(id)
    }

    fn reg() -> SessionRegistry {
        SessionRegistry::new()
    }

    fn at(x: f32) -> Transform {
        Transform::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO)
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_first_session_becomes_global_host() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        assert!(r.is_global_host(sid(1)));
        assert_eq!(r.global_host(), Some(sid(1)));
    }

    #[test]
    fn test_register_later_sessions_are_not_host() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.register(sid(2), "bob".into(), at(1.0));
        assert!(!r.is_global_host(sid(2)));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_register_assigns_palette_color() {
        let mut r = reg();
        let color = r.register(sid(3), "carol".into(), at(0.0)).color;
        assert!(crate::COLOR_PALETTE.contains(&color));
        // Same id always gets the same color.
        assert_eq!(color, crate::color_for(sid(3)));
    }

    // =====================================================================
    // update_transform()
    // =====================================================================

    #[test]
    fn test_update_transform_overwrites_last_write_wins() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.update_transform(sid(1), at(5.0));
        r.update_transform(sid(1), at(9.0));
        assert_eq!(r.get(sid(1)).unwrap().transform, at(9.0));
    }

    #[test]
    fn test_update_transform_unknown_id_is_noop() {
        // Covers the race where an update arrives after disconnect.
        let mut r = reg();
        r.update_transform(sid(99), at(1.0));
        assert!(r.is_empty());
    }

    // =====================================================================
    // deregister()
    // =====================================================================

    #[test]
    fn test_deregister_host_promotes_survivor() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.register(sid(2), "bob".into(), at(1.0));

        let out = r.deregister(sid(1));

        assert!(out.existed);
        assert_eq!(out.host, Vacancy::Replaced(sid(2)));
        assert!(r.is_global_host(sid(2)));
        assert!(r.get(sid(1)).is_none());
    }

    #[test]
    fn test_deregister_non_host_leaves_seat_alone() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.register(sid(2), "bob".into(), at(1.0));

        let out = r.deregister(sid(2));

        assert_eq!(out.host, Vacancy::Unaffected);
        assert!(r.is_global_host(sid(1)));
    }

    #[test]
    fn test_deregister_last_session_dissolves_seat() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        let out = r.deregister(sid(1));
        assert_eq!(out.host, Vacancy::Dissolved);
        assert_eq!(r.global_host(), None);
    }

    #[test]
    fn test_deregister_unknown_id_is_noop() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        let out = r.deregister(sid(42));
        assert!(!out.existed);
        assert_eq!(out.host, Vacancy::Unaffected);
        assert_eq!(r.len(), 1);
    }

    // =====================================================================
    // snapshots and groups
    // =====================================================================

    #[test]
    fn test_snapshot_stamps_host_flag() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.register(sid(2), "bob".into(), at(1.0));

        assert!(r.snapshot(sid(1)).unwrap().is_host);
        assert!(!r.snapshot(sid(2)).unwrap().is_host);
        assert!(r.snapshot(sid(3)).is_none());
    }

    #[test]
    fn test_roster_is_complete() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.register(sid(2), "bob".into(), at(1.0));
        r.register(sid(3), "carol".into(), at(2.0));

        let roster = r.roster();
        assert_eq!(roster.len(), 3);
        let mut names: Vec<_> = roster.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[test]
    fn test_unlobbied_excludes_lobby_members() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.register(sid(2), "bob".into(), at(1.0));
        r.set_lobby(sid(1), Some(thicket_protocol::LobbyId(7)));

        assert_eq!(r.unlobbied(), vec![sid(2)]);
    }

    #[test]
    fn test_set_role_records_assignment() {
        let mut r = reg();
        r.register(sid(1), "alice".into(), at(0.0));
        r.set_role(sid(1), Role::Beast);
        assert_eq!(r.get(sid(1)).unwrap().role, Role::Beast);
    }
}
