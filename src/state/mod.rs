mod fanout;
pub mod room;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{catalog::SongCatalog, error::ServiceError, state::room::RoomState};

pub use self::fanout::{ClientSender, RoomGroups};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the room registry, the membership index, the
/// broadcast groups and the catalog collaborator slot.
///
/// Rooms are authoritative only in this process's memory; a restart drops
/// every active room. Multi-instance deployment is a known open limitation.
pub struct AppState {
    catalog: RwLock<Option<Arc<dyn SongCatalog>>>,
    degraded: watch::Sender<bool>,
    rooms: DashMap<Uuid, Arc<RoomState>>,
    membership: DashMap<Uuid, Uuid>,
    groups: RoomGroups,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a catalog backend is installed.
    pub fn new() -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            catalog: RwLock::new(None),
            degraded: degraded_tx,
            rooms: DashMap::new(),
            membership: DashMap::new(),
            groups: RoomGroups::new(),
        })
    }

    /// Obtain a handle to the current catalog, if one is installed.
    pub async fn catalog(&self) -> Option<Arc<dyn SongCatalog>> {
        let guard = self.catalog.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the catalog or fail the calling operation while degraded.
    pub async fn require_catalog(&self) -> Result<Arc<dyn SongCatalog>, ServiceError> {
        self.catalog().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new catalog implementation and leave degraded mode.
    pub async fn install_catalog(&self, catalog: Arc<dyn SongCatalog>) {
        {
            let mut guard = self.catalog.write().await;
            *guard = Some(catalog);
        }
        self.publish_degraded(false);
    }

    /// Remove the current catalog and enter degraded mode.
    pub async fn clear_catalog(&self) {
        {
            let mut guard = self.catalog.write().await;
            guard.take();
        }
        self.publish_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.catalog.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Registry of active rooms keyed by room id.
    ///
    /// Values are immutable snapshots; structural changes go through
    /// [`AppState::update_room`] so concurrent writers to the same room are
    /// serialized by the per-key entry guard.
    pub fn rooms(&self) -> &DashMap<Uuid, Arc<RoomState>> {
        &self.rooms
    }

    /// One-room-per-user index mapping user id to the occupied room id.
    ///
    /// An entry exists iff the user is in the participant set of the room it
    /// points to. The registry is always mutated before this index.
    pub fn membership(&self) -> &DashMap<Uuid, Uuid> {
        &self.membership
    }

    /// Per-room broadcast groups.
    pub fn groups(&self) -> &RoomGroups {
        &self.groups
    }

    /// Replace a room's snapshot with `mutate(current)` under the registry's
    /// per-key entry guard, making the read-modify-write linearizable with
    /// every other structural change to the same room.
    ///
    /// Returns the new snapshot, or `None` when the room no longer exists.
    pub fn update_room<F>(&self, room_id: Uuid, mutate: F) -> Option<Arc<RoomState>>
    where
        F: FnOnce(&RoomState) -> RoomState,
    {
        let mut entry = self.rooms.get_mut(&room_id)?;
        let next = Arc::new(mutate(entry.value()));
        *entry = Arc::clone(&next);
        Some(next)
    }

    /// Publish the degraded flag to watchers.
    ///
    /// `send_replace` stores the value unconditionally; watchers compare
    /// against their last-seen value themselves, so no change detection is
    /// needed here.
    fn publish_degraded(&self, value: bool) {
        self.degraded.send_replace(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogResult, Song};
    use crate::state::room::PlaybackState;
    use futures::future::BoxFuture;

    struct NullCatalog;

    impl SongCatalog for NullCatalog {
        fn resolve(&self, _id: Uuid) -> BoxFuture<'static, CatalogResult<Option<Song>>> {
            Box::pin(async { Ok(None) })
        }

        fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn catalog_slot_drives_the_degraded_watch() {
        let state = AppState::new();
        let mut rx = state.degraded_watcher();
        assert!(*rx.borrow_and_update());

        state.install_catalog(Arc::new(NullCatalog)).await;
        assert!(!state.is_degraded().await);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());

        state.clear_catalog().await;
        assert!(state.is_degraded().await);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn update_room_swaps_whole_snapshots() {
        let state = AppState::new();
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let room_id = Uuid::new_v4();
        let room = Arc::new(RoomState::new(room_id, "Party".into(), host));
        state.rooms().insert(room_id, room);

        let updated = state
            .update_room(room_id, |room| room.with_participant(guest))
            .unwrap();
        assert_eq!(updated.participants.len(), 2);

        let stored = Arc::clone(state.rooms().get(&room_id).unwrap().value());
        assert_eq!(stored.participants.len(), 2);
        assert_eq!(stored.playback.state, PlaybackState::Stopped);
    }

    #[test]
    fn update_room_reports_missing_rooms() {
        let state = AppState::new();
        assert!(
            state
                .update_room(Uuid::new_v4(), |room| room.clone())
                .is_none()
        );
    }
}
