//! Image upload handler

use std::sync::Arc;

use axum::{extract::{Multipart, State}, Json};
use zapimg_core::models::UploadResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadService;
use crate::session::SessionContext;
use crate::state::AppState;

/// Upload an image (multipart field `image`).
///
/// The file is re-encoded per the format policy, named by a generated
/// identifier, and written to object storage. Gated by the access gate:
/// free-tier quota or a settled Lightning payment.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded", body = UploadResponse),
        (status = 400, description = "Bad file (too large / wrong type)", body = ErrorResponse),
        (status = 401, description = "Quota exhausted and no settled payment", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let service = UploadService::new(&state);
    let response = service.upload_image(&session, multipart).await?;
    Ok(Json(response))
}
