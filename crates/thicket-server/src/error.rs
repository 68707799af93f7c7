//! Unified error type for the server crate.

use thicket_lobby::LobbyError;
use thicket_protocol::ProtocolError;
use thicket_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ThicketError {
    /// A transport-level error (connection, send, recv, bind).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby validation error. These normally travel back to the
    /// client as `ServerMessage::Error` rather than surfacing here.
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_protocol::SessionId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let thicket_err: ThicketError = err.into();
        assert!(matches!(thicket_err, ThicketError::Transport(_)));
        assert!(thicket_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let thicket_err: ThicketError = err.into();
        assert!(matches!(thicket_err, ThicketError::Protocol(_)));
    }

    #[test]
    fn test_from_lobby_error() {
        let err = LobbyError::NotHost(SessionId(1));
        let thicket_err: ThicketError = err.into();
        assert!(matches!(thicket_err, ThicketError::Lobby(_)));
    }
}
