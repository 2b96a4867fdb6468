use std::sync::{Arc, Mutex, OnceLock};

use axum::{extract::State, Json};
use sysinfo::System;
use tracing::debug;

use crate::models::DiagnosticsResponse;
use crate::AppState;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Aggregate room, session and process statistics.
pub async fn diagnostics(State(app_state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    debug!("Diagnostics requested");

    let active_rooms = app_state.lifecycle.store().room_count().await as u32;
    let active_sessions = app_state.lifecycle.registry().session_count().await as u32;

    // System stats
    let (cpu_usage, memory_used, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    Json(DiagnosticsResponse {
        active_rooms,
        active_sessions,
        cpu_usage,
        memory_used,
        memory_free,
        memory_total,
    })
}
