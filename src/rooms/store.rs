use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};

use super::error::RoomError;
use super::state::{generate_room_id, ConnectionId, FieldUpdate, RoomEvent, RoomSnapshot, RoomState};

/// Attempts at generating a non-colliding room id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// Owns the mapping from room id to room state.
///
/// The outer map lock is only held for lookup, insertion and deletion; each
/// room carries its own mutex, so edits in unrelated rooms never contend.
/// Mutation and fan-out for one room commit under that room's mutex, which
/// is the per-room serialization point every broadcast order derives from.
pub struct RoomStore {
    rooms: RwLock<HashMap<String, Arc<Mutex<RoomState>>>>,
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new empty room and return its id.
    ///
    /// The caller is expected to add itself as a member right after; creation
    /// and joining are kept separate so they compose.
    pub async fn create_room(&self) -> Result<String, RoomError> {
        let mut rooms = self.rooms.write().await;
        for _ in 0..MAX_ID_ATTEMPTS {
            let room_id = generate_room_id();
            if rooms.contains_key(&room_id) {
                warn!("Room id collision on {room_id}, regenerating");
                continue;
            }
            rooms.insert(room_id.clone(), Arc::new(Mutex::new(RoomState::new())));
            info!("Room created: {room_id}");
            return Ok(room_id);
        }
        Err(RoomError::IdAllocation)
    }

    /// Current artifacts of a room.
    pub async fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot, RoomError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(room_id).ok_or(RoomError::RoomNotFound)?;
        let snapshot = room.lock().await.snapshot();
        Ok(snapshot)
    }

    /// Add a member to a room.
    ///
    /// Returns the room's current snapshot together with a fresh subscription
    /// to its fan-out channel. Both are taken under the room mutex, so no
    /// update can fall between the snapshot and the first received event —
    /// this is what brings a late joiner up to date without a gap. Adding an
    /// already-present member just re-subscribes.
    pub async fn add_member(
        &self,
        room_id: &str,
        conn_id: ConnectionId,
    ) -> Result<(RoomSnapshot, broadcast::Receiver<RoomEvent>), RoomError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(room_id).ok_or(RoomError::RoomNotFound)?;
        let mut state = room.lock().await;
        state.members.insert(conn_id);
        Ok((state.snapshot(), state.events.subscribe()))
    }

    /// Remove a member from a room, deleting the room once its member set
    /// empties. Unknown rooms and non-members are a no-op.
    pub async fn remove_member(&self, room_id: &str, conn_id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get(room_id).cloned() else {
            return;
        };
        let now_empty = {
            let mut state = room.lock().await;
            state.members.remove(&conn_id);
            state.members.is_empty()
        };
        if now_empty {
            rooms.remove(room_id);
            info!("Room deleted: {room_id} (no members left)");
        }
    }

    /// Last-writer-wins overwrite of one field, fanned out to the room's
    /// subscribers in the same critical section.
    pub async fn update_field(
        &self,
        room_id: &str,
        sender: Option<ConnectionId>,
        update: FieldUpdate,
    ) -> Result<(), RoomError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(room_id).ok_or(RoomError::RoomNotFound)?;
        let mut state = room.lock().await;
        let message = state.apply(update);
        // A send error just means no member is currently subscribed.
        let _ = state.events.send(RoomEvent { sender, message });
        Ok(())
    }

    /// Whether `conn_id` is currently in the room's member set.
    pub async fn is_member(&self, room_id: &str, conn_id: ConnectionId) -> bool {
        let rooms = self.rooms.read().await;
        match rooms.get(room_id) {
            Some(room) => room.lock().await.members.contains(&conn_id),
            None => false,
        }
    }

    /// Number of members in a room.
    pub async fn member_count(&self, room_id: &str) -> Result<usize, RoomError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(room_id).ok_or(RoomError::RoomNotFound)?;
        let count = room.lock().await.members.len();
        Ok(count)
    }

    /// Number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServerMessage;
    use crate::rooms::state::DEFAULT_DOCUMENT;
    use uuid::Uuid;

    #[tokio::test]
    async fn created_room_ids_are_distinct() {
        let store = RoomStore::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let id = store.create_room().await.unwrap();
            assert!(id.starts_with("room-"));
            assert!(seen.insert(id), "duplicate room id");
        }
        assert_eq!(store.room_count().await, 50);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_room_fails() {
        let store = RoomStore::new();
        assert_eq!(
            store.snapshot("room-zzz").await.unwrap_err(),
            RoomError::RoomNotFound
        );
    }

    #[tokio::test]
    async fn add_member_is_idempotent() {
        let store = RoomStore::new();
        let room_id = store.create_room().await.unwrap();
        let conn = Uuid::new_v4();
        store.add_member(&room_id, conn).await.unwrap();
        store.add_member(&room_id, conn).await.unwrap();
        assert_eq!(store.member_count(&room_id).await.unwrap(), 1);
        assert!(store.is_member(&room_id, conn).await);
        assert!(!store.is_member(&room_id, Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn removing_last_member_deletes_room() {
        let store = RoomStore::new();
        let room_id = store.create_room().await.unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.add_member(&room_id, a).await.unwrap();
        store.add_member(&room_id, b).await.unwrap();

        store.remove_member(&room_id, a).await;
        assert!(store.snapshot(&room_id).await.is_ok(), "room still has a member");

        store.remove_member(&room_id, b).await;
        assert_eq!(
            store.snapshot(&room_id).await.unwrap_err(),
            RoomError::RoomNotFound
        );
    }

    #[tokio::test]
    async fn remove_member_is_a_noop_for_unknown_room_or_member() {
        let store = RoomStore::new();
        store.remove_member("room-zzz", Uuid::new_v4()).await;

        let room_id = store.create_room().await.unwrap();
        let member = Uuid::new_v4();
        store.add_member(&room_id, member).await.unwrap();
        // removing a connection that never joined must not delete the room
        store.remove_member(&room_id, Uuid::new_v4()).await;
        assert!(store.snapshot(&room_id).await.is_ok());
    }

    #[tokio::test]
    async fn update_field_is_last_writer_wins() {
        let store = RoomStore::new();
        let room_id = store.create_room().await.unwrap();
        let snap = store.snapshot(&room_id).await.unwrap();
        assert_eq!(snap.document, DEFAULT_DOCUMENT);

        store
            .update_field(&room_id, None, FieldUpdate::Document("one".into()))
            .await
            .unwrap();
        store
            .update_field(&room_id, None, FieldUpdate::Document("two".into()))
            .await
            .unwrap();

        let snap = store.snapshot(&room_id).await.unwrap();
        assert_eq!(snap.document, "two");
        // the other fields are independent of the document
        assert!(snap.annotation_layer.is_none());
        assert!(snap.reference_image.is_none());
    }

    #[tokio::test]
    async fn update_field_on_unknown_room_fails() {
        let store = RoomStore::new();
        assert_eq!(
            store
                .update_field("room-zzz", None, FieldUpdate::Document("x".into()))
                .await
                .unwrap_err(),
            RoomError::RoomNotFound
        );
    }

    #[tokio::test]
    async fn broadcasts_arrive_in_application_order() {
        let store = RoomStore::new();
        let room_id = store.create_room().await.unwrap();
        let conn = Uuid::new_v4();
        let (_snap, mut rx) = store.add_member(&room_id, conn).await.unwrap();

        store
            .update_field(&room_id, Some(conn), FieldUpdate::Document("first".into()))
            .await
            .unwrap();
        store
            .update_field(&room_id, Some(conn), FieldUpdate::Document("second".into()))
            .await
            .unwrap();

        for expected in ["first", "second"] {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.sender, Some(conn));
            match event.message {
                ServerMessage::CodeUpdate(msg) => assert_eq!(msg.code, expected),
                other => panic!("unexpected broadcast: {other:?}"),
            }
        }
    }
}
