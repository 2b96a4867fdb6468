use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::models::{ErrorResponse, UploadResponse};
use crate::AppState;

/// Upload a reference image for a room.
///
/// The file is stored under the configured uploads directory and its locator
/// is written into the room's state, fanning out an `image` broadcast to
/// every member. An unknown room id still stores the file and returns the
/// locator; only the broadcast is skipped.
pub async fn upload_image(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut room_id: Option<String> = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("roomId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Invalid roomId field: {e}")))?;
                room_id = Some(value);
            }
            Some("image") => {
                let extension = field
                    .file_name()
                    .and_then(|name| Path::new(name).extension())
                    .and_then(|ext| ext.to_str())
                    .map(|ext| format!(".{ext}"))
                    .unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Invalid image field: {e}")))?;
                let filename = format!("{}{}", Utc::now().timestamp_millis(), extension);
                image = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let Some((filename, data)) = image else {
        return Err(bad_request("No file uploaded".to_string()));
    };

    let uploads_dir = Path::new(&app_state.config.uploads_dir);
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| internal_error(format!("Failed to create uploads directory: {e}")))?;
    tokio::fs::write(uploads_dir.join(&filename), &data)
        .await
        .map_err(|e| internal_error(format!("Failed to store upload: {e}")))?;

    let url = format!("{}/uploads/{}", app_state.config.public_base_url(), filename);
    info!("Stored upload {filename} ({} bytes)", data.len());

    // Same broadcast path as any other edit; a vanished room only skips the
    // fan-out, the stored file and its locator are still returned.
    if let Some(room_id) = room_id {
        if let Err(e) = app_state
            .lifecycle
            .router()
            .route_upload(&room_id, url.clone())
            .await
        {
            warn!("Upload for room {room_id} not broadcast: {e}");
        }
    }

    Ok(Json(UploadResponse { url }))
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            code: StatusCode::BAD_REQUEST.as_u16(),
            status: "error".to_string(),
            error: message,
        }),
    )
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    error!("{message}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            status: "error".to_string(),
            error: message,
        }),
    )
}
