//! Lobby lifecycle management for Thicket.
//!
//! A lobby is a named, capacity-bounded pre-game grouping of sessions.
//! This crate owns lobby CRUD, the one-lobby-per-session invariant,
//! host designation and migration (via the registry crate's
//! [`HostElection`](thicket_registry::HostElection)), and the one-shot
//! Beast role draw at game start.
//!
//! # Key types
//!
//! - [`LobbyManager`] — the injected store: creates/destroys lobbies,
//!   routes membership changes, reports what to broadcast
//! - [`Lobby`] — one lobby's state: ordered members, phase, election
//! - [`Departure`], [`Kicked`], [`StartedGame`] — outcome reports that
//!   tell the connection handler exactly which notifications to fan out
//! - [`LobbyError`] — the validation failures surfaced to clients

mod error;
mod lobby;
mod manager;

pub use error::LobbyError;
pub use lobby::Lobby;
pub use manager::{Departure, Kicked, LobbyManager, StartedGame};
