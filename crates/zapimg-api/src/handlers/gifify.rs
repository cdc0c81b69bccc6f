//! Video-to-GIF upload handler

use std::sync::Arc;

use axum::{extract::{Multipart, State}, Json};
use zapimg_core::models::UploadResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadService;
use crate::session::SessionContext;
use crate::state::AppState;

/// Convert an uploaded video clip into a stored animated GIF.
///
/// Multipart fields: `video` (the clip), `crop` (JSON `{x,y,width,height}`
/// as fractions of the source dimensions) and `length` (seconds to keep).
#[utoipa::path(
    post,
    path = "/upload/gifify",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "GIF rendered and uploaded", body = UploadResponse),
        (status = 400, description = "Invalid video, crop or length", body = ErrorResponse),
        (status = 401, description = "Quota exhausted and no settled payment", body = ErrorResponse),
        (status = 500, description = "Transcode or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, multipart), fields(operation = "gifify"))]
pub async fn gifify(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let service = UploadService::new(&state);
    let response = service.gifify(&session, multipart).await?;
    Ok(Json(response))
}
