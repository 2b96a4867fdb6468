use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregated server diagnostics
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    /// Rooms with at least one member
    pub active_rooms: u32,
    /// Live websocket sessions
    pub active_sessions: u32,
    /// Process CPU usage in percent
    pub cpu_usage: f32,
    /// Used memory in bytes
    pub memory_used: u64,
    /// Free memory in bytes
    pub memory_free: u64,
    /// Total memory in bytes
    pub memory_total: u64,
}
