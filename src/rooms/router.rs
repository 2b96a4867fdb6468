use std::sync::Arc;

use tracing::debug;

use super::error::RoomError;
use super::registry::SessionRegistry;
use super::state::{ConnectionId, FieldUpdate};
use super::store::RoomStore;

/// Validates an edit against room membership, applies it to the room state
/// and fans it out to the other members.
///
/// The membership gate lives here; the mutation and the fan-out themselves
/// commit under the room's mutex inside `RoomStore::update_field`, so every
/// subscriber observes broadcasts in the order the mutations were applied.
pub struct BroadcastRouter {
    store: Arc<RoomStore>,
    registry: Arc<SessionRegistry>,
}

impl BroadcastRouter {
    pub fn new(store: Arc<RoomStore>, registry: Arc<SessionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Route an edit coming in over a websocket connection.
    pub async fn route_edit(
        &self,
        conn_id: ConnectionId,
        room_id: &str,
        update: FieldUpdate,
    ) -> Result<(), RoomError> {
        if !self.registry.is_joined(conn_id, room_id).await {
            debug!("Rejected edit from {conn_id}: not a member of {room_id}");
            return Err(RoomError::NotAMember);
        }
        self.store.update_field(room_id, Some(conn_id), update).await
    }

    /// Route a completed image upload into a room.
    ///
    /// Uploads arrive over HTTP, so there is no originating connection to
    /// exclude; every current member receives the broadcast.
    pub async fn route_upload(&self, room_id: &str, url: String) -> Result<(), RoomError> {
        self.store
            .update_field(room_id, None, FieldUpdate::ReferenceImage(url))
            .await
    }
}
