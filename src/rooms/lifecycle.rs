use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use super::error::RoomError;
use super::registry::SessionRegistry;
use super::router::BroadcastRouter;
use super::state::{ConnectionId, FieldUpdate, RoomEvent, RoomSnapshot};
use super::store::RoomStore;

/// Orchestrates connect, create/join/leave and disconnect transitions across
/// the store, the registry and the router.
///
/// Every failure comes back as a `RoomError` for the transport layer to
/// report to the requesting connection only; nothing here is fatal and
/// nothing leaks into other rooms or connections.
pub struct ConnectionLifecycleManager {
    store: Arc<RoomStore>,
    registry: Arc<SessionRegistry>,
    router: BroadcastRouter,
}

impl Default for ConnectionLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionLifecycleManager {
    pub fn new() -> Self {
        let store = Arc::new(RoomStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let router = BroadcastRouter::new(store.clone(), registry.clone());
        Self {
            store,
            registry,
            router,
        }
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn router(&self) -> &BroadcastRouter {
        &self.router
    }

    /// A new connection arrived.
    pub async fn on_connect(&self, conn_id: ConnectionId) {
        self.registry.register_session(conn_id).await;
    }

    /// Create a room and join it, returning the new room id together with the
    /// subscription to its fan-out channel.
    pub async fn on_create_room(
        &self,
        conn_id: ConnectionId,
    ) -> Result<(String, broadcast::Receiver<RoomEvent>), RoomError> {
        let room_id = self.store.create_room().await?;
        let (_snapshot, rx) = self.store.add_member(&room_id, conn_id).await?;
        self.registry.record_join(conn_id, &room_id).await;
        info!("Connection {conn_id} created and joined room {room_id}");
        Ok((room_id, rx))
    }

    /// Join an existing room.
    ///
    /// The returned snapshot carries the room's latest artifacts, not the
    /// defaults — this is the synchronization point that brings a late joiner
    /// up to date. A failed join changes nothing.
    pub async fn on_join_room(
        &self,
        conn_id: ConnectionId,
        room_id: &str,
    ) -> Result<(RoomSnapshot, broadcast::Receiver<RoomEvent>), RoomError> {
        let (snapshot, rx) = self.store.add_member(room_id, conn_id).await?;
        self.registry.record_join(conn_id, room_id).await;
        info!("Connection {conn_id} joined room {room_id}");
        Ok((snapshot, rx))
    }

    /// Apply an edit and fan it out to the other members.
    pub async fn on_edit(
        &self,
        conn_id: ConnectionId,
        room_id: &str,
        update: FieldUpdate,
    ) -> Result<(), RoomError> {
        self.router.route_edit(conn_id, room_id, update).await
    }

    /// Leave one room while staying connected.
    pub async fn on_leave_room(&self, conn_id: ConnectionId, room_id: &str) {
        self.registry.record_leave(conn_id, room_id).await;
        self.store.remove_member(room_id, conn_id).await;
        info!("Connection {conn_id} left room {room_id}");
    }

    /// The connection went away. Terminal; releases every membership it held.
    pub async fn on_disconnect(&self, conn_id: ConnectionId) {
        let affected = self.registry.drop_session(conn_id).await;
        for room_id in &affected {
            self.store.remove_member(room_id, conn_id).await;
        }
        info!("Connection {conn_id} disconnected ({} rooms released)", affected.len());
    }
}
