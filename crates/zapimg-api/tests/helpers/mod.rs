//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p zapimg-api`. Storage goes to a
//! per-test temp directory; payments run against the scripted mock
//! processor in [payments].

pub mod fixtures;
pub mod payments;

use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;
use zapimg_api::session::SessionStore;
use zapimg_api::setup::routes::build_router;
use zapimg_api::state::AppState;
use zapimg_core::{Config, PngCompression, StorageBackend};
use zapimg_payments::PaymentVerifier;
use zapimg_storage::LocalStorage;

use payments::MockProcessor;

/// Test application: server plus handles on the mock processor and the
/// storage directory for assertions.
pub struct TestApp {
    pub server: TestServer,
    pub processor: Arc<MockProcessor>,
    pub storage_dir: TempDir,
}

impl TestApp {
    /// Names of the objects written to storage so far.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.storage_dir.path())
            .expect("read storage dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

fn test_config() -> Config {
    let strings = |values: &[&str]| values.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    Config {
        server_port: 0,
        cors_origins: strings(&["http://localhost:3000"]),
        environment: "test".to_string(),
        site_base_url: "https://zapimg.io/".to_string(),
        image_base_url: "https://i.zapimg.io/".to_string(),
        max_file_size_bytes: 5 * 1024 * 1024,
        max_video_size_bytes: 50 * 1024 * 1024,
        free_upload_quota: 2,
        allowed_extensions: strings(&["jpg", "jpeg", "png", "gif", "webp"]),
        allowed_content_types: strings(&[
            "image/jpeg",
            "image/jpg",
            "image/png",
            "image/gif",
            "image/webp",
        ]),
        video_allowed_extensions: strings(&["mp4", "mov", "webm"]),
        video_allowed_content_types: strings(&["video/mp4", "video/quicktime", "video/webm"]),
        jpeg_quality: 70,
        png_compression: PngCompression::Default,
        webp_quality: 80.0,
        gif_encode_speed: 10,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: None,
        local_storage_base_url: None,
        storage_timeout_secs: 5,
        btcpay_base_url: "https://btcpay.test".to_string(),
        btcpay_token: None,
        btcpay_store_id: None,
        payment_amount_sats: 615,
        payment_currency: "SATS".to_string(),
        invoice_expiration_minutes: 90,
        payment_timeout_secs: 2,
        lightning_tip_address: "lnurl1testtip".to_string(),
        session_cookie_name: "zapimg_sid".to_string(),
        session_retention_days: 30,
        session_purge_interval_secs: 3600,
        operator_username: None,
        operator_password: None,
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        transcode_timeout_secs: 30,
        gif_short_edge: 128,
        gif_max_colors: 64,
        gifify_max_length_secs: 10.0,
        url_fetch_timeout_secs: 5,
    }
}

/// Setup a test app with default configuration.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup a test app, letting the caller adjust configuration first.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let storage_dir = tempfile::tempdir().expect("create storage dir");

    let mut config = test_config();
    customize(&mut config);

    let storage = Arc::new(
        LocalStorage::new(
            storage_dir.path(),
            "http://localhost:3001/i".to_string(),
        )
        .await
        .expect("create local storage"),
    );

    let processor = Arc::new(MockProcessor::new());
    let payments = PaymentVerifier::new(processor.clone(), config.payment_amount_sats);
    let sessions = Arc::new(SessionStore::new(config.session_retention_days));

    let state = Arc::new(AppState::new(config, storage, payments, sessions));
    let router = build_router(state);

    // Cookies persist across requests so each TestServer behaves like one
    // browser session.
    let server = TestServer::builder()
        .save_cookies()
        .build(router)
        .expect("start test server");

    TestApp {
        server,
        processor,
        storage_dir,
    }
}
