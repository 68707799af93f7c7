//! Remote entity reconciliation: one live proxy per remote session.
//!
//! On first observation of a remote session the reconciler
//! synchronously inserts a lightweight placeholder at the reported
//! transform — the player is visible immediately — and spawns a load
//! task for the full avatar, keyed by session id. While the load runs,
//! transform updates keep applying to the entity. When the load
//! completes the avatar is swapped in with the entity's *current*
//! transform intact; when the session deregisters first, the task is
//! aborted and any already-completed result is discarded instead of
//! inserting an orphan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thicket_protocol::{Role, SessionId, SessionSnapshot, Transform};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::AvatarLoadError;

/// Loads a remote session's full visual representation.
///
/// Implemented by the presentation shell: `Avatar` is whatever handle
/// the renderer needs (a scene node, a mesh id). Loading is async and
/// may take arbitrarily long or fail; the reconciler tolerates both.
pub trait AvatarLoader: Send + Sync + 'static {
    type Avatar: Send + 'static;

    fn load(
        &self,
        session: &SessionSnapshot,
    ) -> impl Future<Output = Result<Self::Avatar, AvatarLoadError>> + Send;
}

impl<L: AvatarLoader> AvatarLoader for Arc<L> {
    type Avatar = L::Avatar;

    fn load(
        &self,
        session: &SessionSnapshot,
    ) -> impl Future<Output = Result<Self::Avatar, AvatarLoadError>> + Send {
        (**self).load(session)
    }
}

/// The visual representation currently standing in for a remote session.
#[derive(Debug)]
pub enum Proxy<A> {
    /// Lightweight stand-in shown until the real avatar loads. A load
    /// failure leaves the entity here indefinitely.
    Placeholder,
    /// The fully loaded representation.
    Avatar(A),
}

impl<A> Proxy<A> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Proxy::Placeholder)
    }
}

/// One remote session as the local client sees it.
#[derive(Debug)]
pub struct RemoteEntity<A> {
    pub name: String,
    pub color: String,
    pub role: Role,
    pub transform: Transform,
    pub proxy: Proxy<A>,
    last_update: Option<Instant>,
}

/// Manages the set of remote entities and their placeholder→avatar
/// swaps. Owned by the sync loop; all mutation happens on that loop,
/// which is what makes the swap atomic with respect to updates.
pub struct RemoteEntityReconciler<L: AvatarLoader> {
    loader: Arc<L>,
    entities: HashMap<SessionId, RemoteEntity<L::Avatar>>,
    pending: HashMap<SessionId, AbortHandle>,
    completed_tx: mpsc::UnboundedSender<(SessionId, Result<L::Avatar, AvatarLoadError>)>,
    completed_rx: mpsc::UnboundedReceiver<(SessionId, Result<L::Avatar, AvatarLoadError>)>,
}

/// Updates older than this no longer count as "moving".
const MOVEMENT_WINDOW: Duration = Duration::from_millis(250);

impl<L: AvatarLoader> RemoteEntityReconciler<L> {
    pub fn new(loader: L) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            loader: Arc::new(loader),
            entities: HashMap::new(),
            pending: HashMap::new(),
            completed_tx,
            completed_rx,
        }
    }

    /// Registers a remote session: placeholder now, avatar later.
    ///
    /// Observing an already-known session just refreshes its transform
    /// (rosters and incremental joins can overlap).
    pub fn observe(&mut self, snapshot: &SessionSnapshot) {
        if let Some(entity) = self.entities.get_mut(&snapshot.id) {
            entity.transform = snapshot.transform;
            return;
        }

        self.entities.insert(
            snapshot.id,
            RemoteEntity {
                name: snapshot.name.clone(),
                color: snapshot.color.clone(),
                role: snapshot.role,
                transform: snapshot.transform,
                proxy: Proxy::Placeholder,
                last_update: None,
            },
        );

        let loader = Arc::clone(&self.loader);
        let tx = self.completed_tx.clone();
        let snapshot = snapshot.clone();
        let id = snapshot.id;
        let task = tokio::spawn(async move {
            let result = loader.load(&snapshot).await;
            let _ = tx.send((id, result));
        });
        self.pending.insert(id, task.abort_handle());
        tracing::debug!(session_id = %id, "placeholder up, avatar loading");
    }

    /// Applies a transform update to whichever representation is
    /// canonical right now. Unknown ids are a silent no-op.
    pub fn apply_update(&mut self, id: SessionId, transform: Transform) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.transform = transform;
            entity.last_update = Some(Instant::now());
        }
    }

    /// Records a role assignment from a game start.
    pub fn set_role(&mut self, id: SessionId, role: Role) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.role = role;
        }
    }

    /// Tears down a remote session's proxy and cancels its load.
    pub fn remove(&mut self, id: SessionId) {
        if let Some(handle) = self.pending.remove(&id) {
            handle.abort();
        }
        if self.entities.remove(&id).is_some() {
            tracing::debug!(session_id = %id, "remote entity removed");
        }
    }

    /// Applies finished loads: swaps avatars in for entities that still
    /// exist, discards results for sessions that disconnected mid-load.
    /// Returns the ids that were swapped.
    ///
    /// Called from the sync loop, so a swap can never interleave with
    /// an update — the entity's current transform carries over to the
    /// avatar untouched.
    pub fn drain_completed(&mut self) -> Vec<SessionId> {
        let mut swapped = Vec::new();
        while let Ok((id, result)) = self.completed_rx.try_recv() {
            self.pending.remove(&id);
            let Some(entity) = self.entities.get_mut(&id) else {
                tracing::debug!(session_id = %id, "load finished after disconnect, discarded");
                continue;
            };
            match result {
                Ok(avatar) => {
                    entity.proxy = Proxy::Avatar(avatar);
                    swapped.push(id);
                    tracing::debug!(session_id = %id, "avatar swapped in");
                }
                Err(e) => {
                    // No retry: the placeholder simply stays.
                    tracing::warn!(session_id = %id, error = %e, "avatar load failed");
                }
            }
        }
        swapped
    }

    pub fn entity(&self, id: SessionId) -> Option<&RemoteEntity<L::Avatar>> {
        self.entities.get(&id)
    }

    pub fn transform_of(&self, id: SessionId) -> Option<Transform> {
        self.entities.get(&id).map(|e| e.transform)
    }

    /// Whether the entity received a transform update recently. This is
    /// an arrival-rate heuristic, not true velocity — it's what drives
    /// walk animations for remote players.
    pub fn is_moving(&self, id: SessionId) -> bool {
        self.is_moving_within(id, MOVEMENT_WINDOW)
    }

    pub fn is_moving_within(&self, id: SessionId, window: Duration) -> bool {
        self.entities
            .get(&id)
            .and_then(|e| e.last_update)
            .is_some_and(|at| at.elapsed() <= window)
    }

    /// All remote entities, for the shell's render pass.
    pub fn entities(&self) -> impl Iterator<Item = (SessionId, &RemoteEntity<L::Avatar>)> {
        self.entities.iter().map(|(&id, entity)| (id, entity))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
