//! # Thicket server
//!
//! The real-time session layer for a browser-based 3D tag game: admits
//! players over WebSocket, groups them into lobbies, elects and
//! migrates hosts, assigns the Beast role at game start, and relays
//! per-player transforms and actions to everyone else in the session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use thicket_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ThicketError> {
//!     let server = ServerBuilder::new()
//!         .config(ServerConfig::from_env())
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

pub mod config;
mod diagnostics;
mod error;
mod handler;
mod server;
mod state;

pub use config::ServerConfig;
pub use error::ThicketError;
pub use server::{Server, ServerBuilder};

/// The common imports for running a Thicket server.
pub mod prelude {
    pub use crate::{Server, ServerBuilder, ServerConfig, ThicketError};
    pub use thicket_lobby::{LobbyError, LobbyManager};
    pub use thicket_protocol::{
        ClientMessage, ErrorKind, LobbyId, LobbyMember, LobbyPhase,
        LobbySnapshot, Role, RoleAssignment, ServerMessage, SessionId,
        SessionSnapshot, Transform, Vec3,
    };
    pub use thicket_registry::{HostElection, SessionRegistry};
}
