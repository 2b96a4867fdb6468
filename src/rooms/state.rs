use std::collections::HashSet;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{
    CanvasSnapshotMessage, CodeUpdateMessage, ImageMessage, ServerMessage,
};

/// Identifier assigned to each websocket connection on upgrade.
pub type ConnectionId = Uuid;

/// Document content every freshly created room starts with.
pub const DEFAULT_DOCUMENT: &str = "Upload the Figma File and Start Coding Frontend";

/// Capacity of each room's fan-out channel.
const ROOM_CHANNEL_CAPACITY: usize = 100;

/// A last-writer-wins overwrite of exactly one room field.
#[derive(Debug, Clone)]
pub enum FieldUpdate {
    Document(String),
    AnnotationLayer(Vec<u8>),
    ReferenceImage(String),
}

/// One event on a room's fan-out channel.
///
/// `sender` is the connection the update originated from, so each subscriber
/// can drop its own events before writing to the socket. HTTP-originated
/// image updates carry `None` and are delivered to every member.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub sender: Option<ConnectionId>,
    pub message: ServerMessage,
}

/// Copy of a room's current artifacts, handed to a late joiner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub document: String,
    pub annotation_layer: Option<Vec<u8>>,
    pub reference_image: Option<String>,
}

/// Mutable state of one active room.
///
/// Owned by the `RoomStore` behind one mutex per room; all mutation goes
/// through the store's operations.
#[derive(Debug)]
pub struct RoomState {
    pub(crate) document: String,
    pub(crate) annotation_layer: Option<Vec<u8>>,
    pub(crate) reference_image: Option<String>,
    pub(crate) members: HashSet<ConnectionId>,
    pub(crate) events: broadcast::Sender<RoomEvent>,
}

impl RoomState {
    pub(crate) fn new() -> Self {
        let (events, _rx) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
        Self {
            document: DEFAULT_DOCUMENT.to_string(),
            annotation_layer: None,
            reference_image: None,
            members: HashSet::new(),
            events,
        }
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            document: self.document.clone(),
            annotation_layer: self.annotation_layer.clone(),
            reference_image: self.reference_image.clone(),
        }
    }

    /// Apply a last-writer-wins field overwrite and build the broadcast
    /// message echoing it to the other members.
    pub(crate) fn apply(&mut self, update: FieldUpdate) -> ServerMessage {
        match update {
            FieldUpdate::Document(code) => {
                self.document = code.clone();
                ServerMessage::CodeUpdate(CodeUpdateMessage { code })
            }
            FieldUpdate::AnnotationLayer(canvas_data) => {
                self.annotation_layer = Some(canvas_data.clone());
                ServerMessage::CanvasUpdate(CanvasSnapshotMessage { canvas_data })
            }
            FieldUpdate::ReferenceImage(url) => {
                self.reference_image = Some(url.clone());
                ServerMessage::Image(ImageMessage { url })
            }
        }
    }
}

/// Generate a candidate room id in the `room-<9 alnum>` format.
///
/// Collision checking against the store is the caller's job.
pub(crate) fn generate_room_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("room-{}", &hex[..9])
}
