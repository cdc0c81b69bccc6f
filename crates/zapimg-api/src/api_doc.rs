//! OpenAPI document

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use zapimg_core::models::{AuthInitResponse, AuthVerifyResponse, UploadResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "zapimg API",
        description = "Lightning-gated image and video hosting"
    ),
    paths(
        crate::handlers::auth::auth_init,
        crate::handlers::auth::auth_verify,
        crate::handlers::upload::upload_image,
        crate::handlers::tinify::tinify,
        crate::handlers::gifify::gifify,
    ),
    components(schemas(
        UploadResponse,
        AuthInitResponse,
        AuthVerifyResponse,
        ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Lightning payment authentication"),
        (name = "upload", description = "Media upload and conversion")
    )
)]
pub struct ApiDoc;
