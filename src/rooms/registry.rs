use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::debug;

use super::state::ConnectionId;

/// Maps each live connection to the rooms it has joined.
///
/// A session record is created on connect and destroyed on disconnect; it is
/// the sole source of "which rooms does this disconnecting client affect".
/// In practice a connection holds one room, but the registry does not forbid
/// more.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConnectionId, HashSet<String>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty room set for a newly connected client. Registering an
    /// already-known connection keeps its existing room set.
    pub async fn register_session(&self, conn_id: ConnectionId) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(conn_id).or_default();
        debug!("Session registered: {conn_id}");
    }

    pub async fn record_join(&self, conn_id: ConnectionId, room_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(conn_id)
            .or_default()
            .insert(room_id.to_string());
    }

    pub async fn record_leave(&self, conn_id: ConnectionId, room_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(rooms) = sessions.get_mut(&conn_id) {
            rooms.remove(room_id);
        }
    }

    /// Whether the connection has joined the given room.
    pub async fn is_joined(&self, conn_id: ConnectionId, room_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(&conn_id)
            .map(|rooms| rooms.contains(room_id))
            .unwrap_or(false)
    }

    /// Remove the session entirely, returning every room it was a member of
    /// so the caller can release the memberships against the store.
    pub async fn drop_session(&self, conn_id: ConnectionId) -> Vec<String> {
        let mut sessions = self.sessions.write().await;
        let rooms: Vec<String> = sessions
            .remove(&conn_id)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();
        debug!("Session dropped: {conn_id} ({} rooms affected)", rooms.len());
        rooms
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
