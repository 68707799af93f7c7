//! Client-side sync for Thicket.
//!
//! The rendering, asset loading, and UI around a game client are
//! presentation glue; this crate is the part with actual protocol
//! obligations:
//!
//! - [`ClientRateLimiter`] — gates outbound transform sends to one per
//!   50 ms tick, and only when the transform actually changed
//! - [`RemoteEntityReconciler`] — exactly one live proxy per remote
//!   session: placeholder first, real avatar swapped in when its
//!   (cancellable) load finishes
//! - [`resolve_attack`] — the local range + facing test each client
//!   runs against its own last-known copy of an attacker's transform
//! - [`SyncLoop`] — the single loop driving outbound gated sends and
//!   immediate inbound application
//!
//! What counts as an "avatar" is up to the presentation shell — it
//! plugs in via the [`AvatarLoader`] trait and reads entity transforms
//! back out each frame.

mod combat;
mod error;
mod rate_limiter;
mod reconciler;
mod sync;

pub use combat::{AttackParams, resolve_attack};
pub use error::AvatarLoadError;
pub use rate_limiter::ClientRateLimiter;
pub use reconciler::{AvatarLoader, Proxy, RemoteEntity, RemoteEntityReconciler};
pub use sync::{SEND_INTERVAL, SyncLoop};
