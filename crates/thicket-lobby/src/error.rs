//! Error types for the lobby layer.

use thicket_protocol::{ErrorKind, LobbyId, SessionId};

/// Validation failures for lobby operations.
///
/// Every variant is surfaced to the originating client as a
/// `ServerMessage::Error` — never silently dropped, never broadcast.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// No lobby with that id exists.
    #[error("lobby {0} not found")]
    NotFound(LobbyId),

    /// The lobby has no free member slots.
    #[error("lobby {0} is full")]
    Full(LobbyId),

    /// The session is already a member of a lobby.
    #[error("session {0} is already in a lobby")]
    AlreadyInLobby(SessionId),

    /// The lobby's game is already in progress.
    #[error("lobby {0} has already started")]
    GameAlreadyStarted(LobbyId),

    /// Only the host may perform this operation.
    #[error("session {0} is not the host")]
    NotHost(SessionId),

    /// Fewer members than required to start.
    #[error("need at least {need} players to start, have {have}")]
    InsufficientPlayers { have: usize, need: usize },

    /// The named session is not a member of the lobby.
    #[error("session {0} is not a member")]
    NotAMember(SessionId),
}

impl LobbyError {
    /// The wire-level category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LobbyError::NotFound(_) => ErrorKind::LobbyNotFound,
            LobbyError::Full(_) => ErrorKind::LobbyFull,
            LobbyError::AlreadyInLobby(_) => ErrorKind::AlreadyInLobby,
            LobbyError::GameAlreadyStarted(_) => ErrorKind::GameAlreadyStarted,
            LobbyError::NotHost(_) => ErrorKind::NotHost,
            LobbyError::InsufficientPlayers { .. } => ErrorKind::InsufficientPlayers,
            LobbyError::NotAMember(_) => ErrorKind::NotAMember,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_every_variant() {
        assert_eq!(LobbyError::NotHost(SessionId(1)).kind(), ErrorKind::NotHost);
        assert_eq!(LobbyError::Full(LobbyId(1)).kind(), ErrorKind::LobbyFull);
        assert_eq!(
            LobbyError::InsufficientPlayers { have: 1, need: 2 }.kind(),
            ErrorKind::InsufficientPlayers
        );
    }

    #[test]
    fn test_insufficient_players_message_names_counts() {
        let e = LobbyError::InsufficientPlayers { have: 1, need: 2 };
        assert!(e.to_string().contains("at least 2"));
        assert!(e.to_string().contains("have 1"));
    }
}
