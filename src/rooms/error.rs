/// Errors surfaced by the room core.
///
/// All of these are recovered at the websocket/HTTP boundary and turned into
/// an `error` message for the requesting connection only. None of them
/// terminate a connection or touch other rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    /// The referenced room id is unknown or the room has been vacated.
    RoomNotFound,
    /// The connection attempted an edit on a room it never joined.
    NotAMember,
    /// Room id generation kept colliding with existing rooms.
    IdAllocation,
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomError::RoomNotFound => write!(f, "Room does not exist"),
            RoomError::NotAMember => write!(f, "Not a member of this room"),
            RoomError::IdAllocation => write!(f, "Failed to allocate a room id"),
        }
    }
}

impl std::error::Error for RoomError {}
