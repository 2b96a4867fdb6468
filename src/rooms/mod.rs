//! The room-state synchronization core.
//!
//! Rooms are isolated collaboration sessions holding three last-writer-wins
//! artifacts: the code document, the canvas annotation layer and the uploaded
//! reference image. Edits fan out to every other member of the same room over
//! a per-room broadcast channel; mutation and fan-out commit under one mutex
//! per room, so each room has a total broadcast order and unrelated rooms
//! never contend.

pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod router;
pub mod state;
pub mod store;

pub use error::RoomError;
pub use lifecycle::ConnectionLifecycleManager;
pub use registry::SessionRegistry;
pub use router::BroadcastRouter;
pub use state::{ConnectionId, FieldUpdate, RoomEvent, RoomSnapshot, DEFAULT_DOCUMENT};
pub use store::RoomStore;
