//! Configuration module
//!
//! All configuration is sourced from the environment (with `.env` support in
//! development via dotenvy). Values come with sensible defaults; only the
//! BTCPay credentials are genuinely deployment-specific and are therefore
//! optional here and validated where they are consumed.

use std::env;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    // Public link building
    pub site_base_url: String,
    pub image_base_url: String,

    // Upload limits and accepted formats
    pub max_file_size_bytes: usize,
    pub max_video_size_bytes: usize,
    pub free_upload_quota: u32,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,

    // Image normalization
    pub jpeg_quality: u8,
    pub png_compression: PngCompression,
    pub webp_quality: f32,
    pub gif_encode_speed: i32,

    // Storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub storage_timeout_secs: u64,

    // Payments (BTCPay Server Greenfield API)
    pub btcpay_base_url: String,
    pub btcpay_token: Option<String>,
    pub btcpay_store_id: Option<String>,
    pub payment_amount_sats: u64,
    pub payment_currency: String,
    pub invoice_expiration_minutes: u32,
    pub payment_timeout_secs: u64,
    /// LNURL included in upload responses as a tip/support pointer.
    pub lightning_tip_address: String,

    // Sessions
    pub session_cookie_name: String,
    pub session_retention_days: i64,
    pub session_purge_interval_secs: u64,
    pub operator_username: Option<String>,
    pub operator_password: Option<String>,

    // Transcoding
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub transcode_timeout_secs: u64,
    pub gif_short_edge: u32,
    pub gif_max_colors: u32,
    pub gifify_max_length_secs: f64,
    pub url_fetch_timeout_secs: u64,
}

/// PNG encoder compression selection (the PNG path is lossless; this trades
/// encode time for output size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    Fast,
    Default,
    Best,
}

impl PngCompression {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fast" => PngCompression::Fast,
            "best" => PngCompression::Best,
            _ => PngCompression::Default,
        }
    }
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Configured upload limit in whole megabytes, for user-facing messages.
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size_bytes / 1024 / 1024
    }

    pub fn max_video_size_mb(&self) -> usize {
        self.max_video_size_bytes / 1024 / 1024
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_FILE_SIZE_MB: usize = 5;
        const MAX_VIDEO_SIZE_MB: usize = 50;
        const FREE_UPLOAD_QUOTA: u32 = 2;
        const JPEG_QUALITY: u8 = 70;
        const WEBP_QUALITY: f32 = 80.0;
        const GIF_ENCODE_SPEED: i32 = 10;
        const STORAGE_TIMEOUT_SECS: u64 = 30;
        const PAYMENT_AMOUNT_SATS: u64 = 615;
        const INVOICE_EXPIRATION_MINUTES: u32 = 90;
        const PAYMENT_TIMEOUT_SECS: u64 = 10;
        const SESSION_RETENTION_DAYS: i64 = 30;
        const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;
        const TRANSCODE_TIMEOUT_SECS: u64 = 120;
        const GIF_SHORT_EDGE: u32 = 128;
        const GIF_MAX_COLORS: u32 = 64;
        const GIFIFY_MAX_LENGTH_SECS: f64 = 10.0;
        const URL_FETCH_TIMEOUT_SECS: u64 = 30;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str =
            env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "jpg,jpeg,png,gif,webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| {
                "image/jpeg,image/jpg,image/png,image/gif,image/webp".to_string()
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let video_allowed_extensions = env::var("VIDEO_ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "mp4,mov,webm".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let video_allowed_content_types = env::var("VIDEO_ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "video/mp4,video/quicktime,video/webm".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let storage_backend =
            match env::var("STORAGE_BACKEND").unwrap_or_default().to_lowercase().as_str() {
                "local" => StorageBackend::Local,
                _ => StorageBackend::S3,
            };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            site_base_url: normalize_base_url(
                env::var("SITE_BASE_URL").unwrap_or_else(|_| "https://zapimg.io/".to_string()),
            ),
            image_base_url: normalize_base_url(
                env::var("IMAGE_BASE_URL").unwrap_or_else(|_| "https://i.zapimg.io/".to_string()),
            ),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            free_upload_quota: env::var("FREE_UPLOAD_QUOTA")
                .unwrap_or_else(|_| FREE_UPLOAD_QUOTA.to_string())
                .parse()
                .unwrap_or(FREE_UPLOAD_QUOTA),
            allowed_extensions,
            allowed_content_types,
            video_allowed_extensions,
            video_allowed_content_types,
            jpeg_quality: env::var("JPEG_QUALITY")
                .unwrap_or_else(|_| JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(JPEG_QUALITY),
            png_compression: PngCompression::parse(
                &env::var("PNG_COMPRESSION").unwrap_or_else(|_| "default".to_string()),
            ),
            webp_quality: env::var("WEBP_QUALITY")
                .unwrap_or_else(|_| WEBP_QUALITY.to_string())
                .parse()
                .unwrap_or(WEBP_QUALITY),
            gif_encode_speed: env::var("GIF_ENCODE_SPEED")
                .unwrap_or_else(|_| GIF_ENCODE_SPEED.to_string())
                .parse()
                .unwrap_or(GIF_ENCODE_SPEED),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            storage_timeout_secs: env::var("STORAGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| STORAGE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(STORAGE_TIMEOUT_SECS),
            btcpay_base_url: env::var("BTC_PAY_SERVER_URL")
                .unwrap_or_else(|_| "https://btcpay.zapimg.io".to_string()),
            btcpay_token: env::var("BTC_PAY_SERVER_TOKEN").ok(),
            btcpay_store_id: env::var("BTC_PAY_SERVER_STORE_ID").ok(),
            payment_amount_sats: env::var("PAYMENT_AMOUNT_SATS")
                .unwrap_or_else(|_| PAYMENT_AMOUNT_SATS.to_string())
                .parse()
                .unwrap_or(PAYMENT_AMOUNT_SATS),
            payment_currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "SATS".to_string()),
            invoice_expiration_minutes: env::var("INVOICE_EXPIRATION_MINUTES")
                .unwrap_or_else(|_| INVOICE_EXPIRATION_MINUTES.to_string())
                .parse()
                .unwrap_or(INVOICE_EXPIRATION_MINUTES),
            payment_timeout_secs: env::var("PAYMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| PAYMENT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(PAYMENT_TIMEOUT_SECS),
            lightning_tip_address: env::var("BTC_PAY_SERVER_LNURL").unwrap_or_default(),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "zapimg_sid".to_string()),
            session_retention_days: env::var("SESSION_RETENTION_DAYS")
                .unwrap_or_else(|_| SESSION_RETENTION_DAYS.to_string())
                .parse()
                .unwrap_or(SESSION_RETENTION_DAYS),
            session_purge_interval_secs: env::var("SESSION_PURGE_INTERVAL_SECS")
                .unwrap_or_else(|_| SESSION_PURGE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(SESSION_PURGE_INTERVAL_SECS),
            operator_username: env::var("OPERATOR_USERNAME").ok(),
            operator_password: env::var("OPERATOR_PASSWORD").ok(),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            transcode_timeout_secs: env::var("TRANSCODE_TIMEOUT_SECS")
                .unwrap_or_else(|_| TRANSCODE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODE_TIMEOUT_SECS),
            gif_short_edge: env::var("GIF_SHORT_EDGE")
                .unwrap_or_else(|_| GIF_SHORT_EDGE.to_string())
                .parse()
                .unwrap_or(GIF_SHORT_EDGE),
            gif_max_colors: env::var("GIF_MAX_COLORS")
                .unwrap_or_else(|_| GIF_MAX_COLORS.to_string())
                .parse()
                .unwrap_or(GIF_MAX_COLORS),
            gifify_max_length_secs: env::var("GIFIFY_MAX_LENGTH_SECS")
                .unwrap_or_else(|_| GIFIFY_MAX_LENGTH_SECS.to_string())
                .parse()
                .unwrap_or(GIFIFY_MAX_LENGTH_SECS),
            url_fetch_timeout_secs: env::var("URL_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| URL_FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(URL_FETCH_TIMEOUT_SECS),
        };

        Ok(config)
    }
}

/// Base URLs are concatenated with routes/filenames; keep exactly one
/// trailing slash so link building stays simple.
fn normalize_base_url(url: String) -> String {
    format!("{}/", url.trim_end_matches('/'))
}
