//! URL-fetch GIF handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use zapimg_core::models::UploadResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadService;
use crate::session::SessionContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TinifyQuery {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Fetch a remote image/clip and store a 128px animated GIF rendition.
#[utoipa::path(
    get,
    path = "/upload/tinify",
    tag = "upload",
    params(
        ("imageUrl" = String, Query, description = "Source URL to fetch and shrink")
    ),
    responses(
        (status = 200, description = "GIF rendered and uploaded", body = UploadResponse),
        (status = 400, description = "Invalid URL", body = ErrorResponse),
        (status = 401, description = "Quota exhausted and no settled payment", body = ErrorResponse),
        (status = 500, description = "Fetch, transcode or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session), fields(operation = "tinify", url = %query.image_url))]
pub async fn tinify(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Query(query): Query<TinifyQuery>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let service = UploadService::new(&state);
    let response = service.tinify(&session, &query.image_url).await?;
    Ok(Json(response))
}
