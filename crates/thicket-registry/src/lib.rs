//! Session registry and host election for Thicket.
//!
//! This crate owns the server's answer to "who is connected":
//!
//! 1. **Session records** — identity, transform, color, role, lobby
//!    membership ([`Session`], [`SessionRegistry`])
//! 2. **Host election** — the first-joiner-is-host,
//!    promote-on-departure primitive ([`HostElection`]), used once
//!    globally (inside the registry) and once per lobby
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby layer (above)  ← its own HostElection per lobby
//!     ↕
//! Registry layer (this crate)  ← session records + the global election
//!     ↕
//! Protocol layer (below)  ← SessionId, Transform, SessionSnapshot
//! ```
//!
//! Registry operations are deliberately infallible: updating or
//! deregistering an unknown id is a silent no-op, because such messages
//! are always a benign race with a disconnect.

mod election;
mod registry;
mod session;

pub use election::{HostElection, Vacancy};
pub use registry::{Deregistered, SessionRegistry};
pub use session::{COLOR_PALETTE, Session, color_for};
