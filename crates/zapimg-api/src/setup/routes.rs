//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use zapimg_core::Config;

use crate::api_doc::ApiDoc;
use crate::handlers::{auth, gifify, health, tinify, upload};
use crate::session::session_middleware;
use crate::state::AppState;

/// Headroom above the configured media limits so the orchestrator's own
/// size check (with its limit-naming message) fires before the transport
/// layer's blunt 413 - multipart framing adds overhead too.
const BODY_LIMIT_HEADROOM_BYTES: usize = 2 * 1024 * 1024;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_cap = state
        .config
        .max_file_size_bytes
        .max(state.config.max_video_size_bytes)
        + BODY_LIMIT_HEADROOM_BYTES;

    let cors = setup_cors(&state.config);

    let session_routes = Router::new()
        .route("/auth/init", get(auth::auth_init))
        .route("/auth/verify", get(auth::auth_verify))
        .route("/upload", post(upload::upload_image))
        .route("/upload/tinify", get(tinify::tinify))
        .route("/upload/gifify", post(gifify::gifify))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = Router::new()
        .merge(session_routes)
        .route("/health", get(health::health))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::max(body_cap))
        .layer(RequestBodyLimitLayer::new(body_cap))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let rapidoc: Router = RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi())
        .path("/docs")
        .into();

    app.merge(rapidoc)
}

/// CORS per config: explicit origin allowlist with credentials, or a
/// credential-less permissive policy when '*' is configured (development
/// only; rejected for production at config load).
fn setup_cors(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("pragma"),
        ])
        .allow_credentials(true)
}
