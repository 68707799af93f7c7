//! Session records: the server's view of one connected client.

use std::hash::{DefaultHasher, Hash, Hasher};

use thicket_protocol::{LobbyId, Role, SessionId, SessionSnapshot, Transform};

/// The fixed display palette. Clients render remote avatars tinted with
/// their session's color so players can tell each other apart before
/// models finish loading.
pub const COLOR_PALETTE: [&str; 8] = [
    "#e6194b", // red
    "#3cb44b", // green
    "#4363d8", // blue
    "#f58231", // orange
    "#911eb4", // purple
    "#42d4f4", // cyan
    "#f032e6", // magenta
    "#ffe119", // yellow
];

/// Picks the palette color for a session id.
///
/// `DefaultHasher::new()` hashes with fixed keys, so the same id maps to
/// the same color on every run and every observer.
pub fn color_for(id: SessionId) -> &'static str {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    COLOR_PALETTE[(hasher.finish() % COLOR_PALETTE.len() as u64) as usize]
}

/// A single connected client's record.
///
/// Created on join, mutated by transform updates and role assignment,
/// destroyed on disconnect. Host status is not stored here — it lives in
/// the relevant [`HostElection`](crate::HostElection), so there is
/// exactly one place that can answer "who is host".
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub transform: Transform,
    pub color: &'static str,
    pub role: Role,
    pub lobby: Option<LobbyId>,
}

impl Session {
    pub(crate) fn new(id: SessionId, name: String, transform: Transform) -> Self {
        Self {
            id,
            name,
            transform,
            color: color_for(id),
            role: Role::default(),
            lobby: None,
        }
    }

    /// Builds the wire-ready view of this session. `is_host` is stamped
    /// by the caller from the election at snapshot time.
    pub fn snapshot(&self, is_host: bool) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            name: self.name.clone(),
            transform: self.transform,
            color: self.color.to_string(),
            role: self.role,
            is_host,
            lobby: self.lobby,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_for_is_deterministic() {
        let a = color_for(SessionId(7));
        let b = color_for(SessionId(7));
        assert_eq!(a, b);
        assert!(COLOR_PALETTE.contains(&a));
    }

    #[test]
    fn test_color_for_spreads_across_palette() {
        // Not a uniformity proof — just that the hash isn't collapsing
        // every id onto one palette slot.
        let distinct: std::collections::HashSet<_> =
            (0..64).map(|i| color_for(SessionId(i))).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_new_session_defaults() {
        let s = Session::new(SessionId(1), "alice".into(), Transform::default());
        assert_eq!(s.role, Role::Human);
        assert!(s.lobby.is_none());
        assert_eq!(s.color, color_for(SessionId(1)));
    }
}
