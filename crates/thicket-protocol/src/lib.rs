//! Wire protocol for Thicket.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`SessionId`], [`Transform`], [`Role`], snapshots) — the
//!   structures that travel on the wire.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]) — the full
//!   catalogue for join, transform relay, attacks, chat, and lobbies.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (raw frames) and the
//! session/lobby stores. It knows nothing about connections or
//! membership — only shapes.

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, ErrorKind, ServerMessage};
pub use types::{
    LobbyId, LobbyMember, LobbyPhase, LobbySnapshot, Role, RoleAssignment,
    SessionId, SessionSnapshot, Transform, Vec3,
};
