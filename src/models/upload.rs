use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for a completed reference-image upload
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}
