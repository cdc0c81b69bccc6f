//! Upload orchestration
//!
//! One pipeline behind all three upload routes: admission (access gate) ->
//! extract & validate -> normalize/transcode -> name -> store -> account ->
//! respond. Each step is a sequential suspension point with its own error
//! channel; the first failure is terminal for the request and nothing
//! partial is reported.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Multipart;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use zapimg_core::models::UploadResponse;
use zapimg_core::{is_authorized, AppError, Config, FileId};
use zapimg_processing::{
    normalize, scale_to_short_edge, CropRect, GifRenderSpec, NormalizeOptions, MediaValidator,
    ProcessingError, ScaleMode, ValidationError,
};

use crate::session::SessionContext;
use crate::state::AppState;

/// A file pulled out of a multipart body.
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

pub struct UploadService {
    state: Arc<AppState>,
}

impl UploadService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    fn config(&self) -> &Config {
        &self.state.config
    }

    /// Gate check. Re-evaluated per request against current session state.
    fn check_admission(&self, session: &SessionContext) -> Result<(), AppError> {
        let snapshot = session.snapshot();
        if !is_authorized(&snapshot, self.config().free_upload_quota) {
            return Err(AppError::Unauthenticated(
                "Free upload quota exhausted. Complete a Lightning payment via /auth/init to keep uploading."
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Image upload: validate -> normalize -> store.
    pub async fn upload_image(
        &self,
        session: &SessionContext,
        multipart: Multipart,
    ) -> Result<UploadResponse, AppError> {
        self.check_admission(session)?;

        let file = extract_single_file(multipart, "image").await?;

        let config = self.config();
        let validator = MediaValidator::new(
            config.max_file_size_bytes,
            config.allowed_extensions.clone(),
            config.allowed_content_types.clone(),
        );
        validator
            .validate_file_size(file.data.len())
            .map_err(validation_to_app)?;
        validator
            .validate_content_type(&file.content_type)
            .map_err(validation_to_app)?;
        let extension = validator
            .validate_extension(&file.filename)
            .map_err(validation_to_app)?;

        // Re-encode off the request thread; a large image transform would
        // otherwise stall the scheduler.
        let opts = NormalizeOptions {
            jpeg_quality: config.jpeg_quality,
            png_compression: config.png_compression,
            webp_quality: config.webp_quality,
            gif_encode_speed: config.gif_encode_speed,
        };
        let declared = file.content_type.clone();
        let data = file.data.clone();
        let normalized = tokio::task::spawn_blocking(move || normalize(&data, &declared, &opts))
            .await
            .map_err(|e| AppError::Internal(format!("normalize task panicked: {}", e)))?
            .map_err(processing_to_app)?;

        tracing::debug!(
            original_bytes = file.data.len(),
            normalized_bytes = normalized.data.len(),
            content_type = normalized.content_type,
            "Image normalized"
        );

        self.store_and_respond(
            session,
            &extension,
            normalized.content_type,
            normalized.data.to_vec(),
        )
        .await
    }

    /// Video upload -> cropped/trimmed animated GIF.
    pub async fn gifify(
        &self,
        session: &SessionContext,
        multipart: Multipart,
    ) -> Result<UploadResponse, AppError> {
        self.check_admission(session)?;

        let (video, crop, length) = extract_gifify_parts(multipart).await?;

        let config = self.config();
        if video.data.is_empty() {
            return Err(AppError::InvalidInput(
                "No video file was uploaded.".to_string(),
            ));
        }
        if video.data.len() > config.max_video_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "The video you are trying to upload is too large. Please choose a file with a size smaller than {}MB and try again.",
                config.max_video_size_mb()
            )));
        }
        let declared = video.content_type.to_lowercase();
        if !config.video_allowed_content_types.contains(&declared) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Invalid video type. Please upload a video in one of the following formats: {}.",
                config.video_allowed_extensions.join(", ")
            )));
        }
        if !(length > 0.0 && length <= config.gifify_max_length_secs) {
            return Err(AppError::InvalidInput(format!(
                "length must be between 0 and {} seconds",
                config.gifify_max_length_secs
            )));
        }
        crop.validate().map_err(processing_to_app)?;

        // Request-scoped workspace; dropped (and deleted) on every exit path.
        let workdir = tempfile::tempdir()
            .map_err(|e| AppError::Internal(format!("Failed to create temp directory: {}", e)))?;
        let input_path = workdir.path().join("source");
        let output_path = workdir.path().join("output.gif");

        tokio::fs::write(&input_path, &video.data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write temp file: {}", e)))?;

        let spec = GifRenderSpec {
            duration_secs: Some(length),
            crop,
            scale: ScaleMode::ShortEdge(config.gif_short_edge),
            max_colors: config.gif_max_colors,
        };
        self.state
            .transcoder
            .render(&input_path, &output_path, &spec)
            .await
            .map_err(processing_to_app)?;

        let gif_data = tokio::fs::read(&output_path)
            .await
            .map_err(|e| AppError::Processing(format!("Failed to read transcode output: {}", e)))?;

        self.store_and_respond(session, "gif", "image/gif", gif_data)
            .await
    }

    /// Remote URL -> small animated GIF (128px short edge).
    pub async fn tinify(
        &self,
        session: &SessionContext,
        image_url: &str,
    ) -> Result<UploadResponse, AppError> {
        self.check_admission(session)?;

        let config = self.config();
        let url = image_url.trim();
        if url.is_empty() {
            return Err(AppError::InvalidInput(
                "imageUrl parameter is required".to_string(),
            ));
        }
        let parsed_url = reqwest::Url::parse(url)
            .map_err(|_| AppError::InvalidInput(format!("Invalid URL format: {}", url)))?;
        if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
            return Err(AppError::InvalidInput(
                "Only HTTP and HTTPS URLs are allowed".to_string(),
            ));
        }

        let workdir = tempfile::tempdir()
            .map_err(|e| AppError::Internal(format!("Failed to create temp directory: {}", e)))?;
        let input_path = workdir.path().join("source");
        let output_path = workdir.path().join("output.gif");

        self.fetch_to_file(parsed_url, &input_path).await?;

        let (width, height) = self
            .state
            .probe
            .dimensions(&input_path)
            .await
            .map_err(processing_to_app)?;
        let (target_w, target_h) = scale_to_short_edge(width, height, config.gif_short_edge);

        tracing::debug!(
            source = %url,
            width = width,
            height = height,
            target_width = target_w,
            target_height = target_h,
            "Scaling fetched media"
        );

        let spec = GifRenderSpec {
            duration_secs: None,
            crop: CropRect::full(),
            scale: ScaleMode::Exact {
                width: target_w,
                height: target_h,
            },
            max_colors: config.gif_max_colors,
        };
        self.state
            .transcoder
            .render(&input_path, &output_path, &spec)
            .await
            .map_err(processing_to_app)?;

        let gif_data = tokio::fs::read(&output_path)
            .await
            .map_err(|e| AppError::Processing(format!("Failed to read transcode output: {}", e)))?;

        self.store_and_respond(session, "gif", "image/gif", gif_data)
            .await
    }

    /// Stream a remote source to a local temp file, enforcing the video
    /// size cap as bytes arrive.
    async fn fetch_to_file(
        &self,
        url: reqwest::Url,
        path: &std::path::Path,
    ) -> Result<(), AppError> {
        let config = self.config();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.url_fetch_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let response = client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamTimeout(format!("Fetching {} timed out", url))
            } else {
                AppError::Upstream(format!("Failed to download from URL: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "URL returned status code: {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;

        let mut total: usize = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::Upstream(format!("Failed to read remote body: {}", e)))?;
            total += chunk.len();
            if total > config.max_video_size_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "The remote file is too large. The limit is {}MB.",
                    config.max_video_size_mb()
                )));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to write temp file: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to flush temp file: {}", e)))?;

        Ok(())
    }

    /// Name the artifact, write it to storage (under the configured
    /// deadline), then account the upload and build the response. The
    /// counter moves only after the write succeeded.
    async fn store_and_respond(
        &self,
        session: &SessionContext,
        extension: &str,
        content_type: &'static str,
        data: Vec<u8>,
    ) -> Result<UploadResponse, AppError> {
        let config = self.config();
        let file_id = FileId::generate();
        let file_name = file_id.filename_with_extension(extension);

        let put = tokio::time::timeout(
            Duration::from_secs(config.storage_timeout_secs),
            self.state.storage.put(&file_name, content_type, data),
        )
        .await
        .map_err(|_| {
            AppError::UpstreamTimeout(format!(
                "storage put timed out after {}s",
                config.storage_timeout_secs
            ))
        })?;
        put.map_err(|e| AppError::Storage(e.to_string()))?;

        let total_uploads = session.update(|s| {
            s.total_uploads += 1;
            s.total_uploads
        });

        tracing::info!(
            file_id = %file_id,
            file_name = %file_name,
            content_type = content_type,
            total_uploads = total_uploads,
            "Upload stored"
        );

        Ok(build_upload_response(
            &config.site_base_url,
            &config.image_base_url,
            &config.lightning_tip_address,
            &file_id,
            &file_name,
        ))
    }
}

/// Build the success payload. Base URLs carry a trailing slash
/// (normalized at config load).
fn build_upload_response(
    site_base_url: &str,
    image_base_url: &str,
    tip_address: &str,
    file_id: &FileId,
    file_name: &str,
) -> UploadResponse {
    UploadResponse {
        route: format!("/i/{}", file_name),
        url: format!("{}i/{}", site_base_url, file_name),
        image_url: format!("{}{}", image_base_url, file_name),
        file_name: file_name.to_string(),
        file_id: file_id.as_str().to_string(),
        message: "Image uploaded successfully.".to_string(),
        lightning_destination: tip_address.to_string(),
        lightning_payment_link: format!("lightning:{}", tip_address),
    }
}

/// Pull a single named file out of a multipart body.
async fn extract_single_file(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some(field_name) {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|e| {
                AppError::InvalidInput(format!("Failed to read uploaded file: {}", e))
            })?;
            return Ok(UploadedFile {
                filename,
                content_type,
                data,
            });
        }
    }

    Err(AppError::InvalidInput(format!(
        "Missing multipart field '{}'",
        field_name
    )))
}

/// Pull the gifify parts out of a multipart body: the `video` file plus the
/// `crop` (JSON fractions) and `length` (seconds) form fields.
async fn extract_gifify_parts(
    mut multipart: Multipart,
) -> Result<(UploadedFile, CropRect, f64), AppError> {
    let mut video: Option<UploadedFile> = None;
    let mut crop: Option<CropRect> = None;
    let mut length: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("video") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read uploaded file: {}", e))
                })?;
                video = Some(UploadedFile {
                    filename,
                    content_type,
                    data,
                });
            }
            Some("crop") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read crop field: {}", e))
                })?;
                crop = Some(serde_json::from_str(&text).map_err(|e| {
                    AppError::InvalidInput(format!("Invalid crop JSON: {}", e))
                })?);
            }
            Some("length") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read length field: {}", e))
                })?;
                length = Some(text.trim().parse().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid length value: {}", text))
                })?);
            }
            _ => {}
        }
    }

    let video =
        video.ok_or_else(|| AppError::InvalidInput("Missing multipart field 'video'".to_string()))?;
    let crop = crop.ok_or_else(|| AppError::InvalidInput("Missing form field 'crop'".to_string()))?;
    let length =
        length.ok_or_else(|| AppError::InvalidInput("Missing form field 'length'".to_string()))?;

    Ok((video, crop, length))
}

/// Map validation failures onto the client-facing error taxonomy. The size
/// message names the configured limit; the format message lists what is
/// accepted.
fn validation_to_app(err: ValidationError) -> AppError {
    match err {
        ValidationError::FileTooLarge { max, .. } => AppError::PayloadTooLarge(format!(
            "The file you are trying to upload is too large. Please choose a file with a size smaller than {}MB and try again.",
            max / 1024 / 1024
        )),
        ValidationError::EmptyFile => {
            AppError::InvalidInput("No file was uploaded or the file is empty.".to_string())
        }
        ValidationError::InvalidContentType { allowed, .. } => {
            AppError::UnsupportedMediaType(invalid_format_message(&allowed))
        }
        ValidationError::InvalidExtension { allowed, .. } => {
            AppError::UnsupportedMediaType(invalid_format_message(&allowed))
        }
        ValidationError::MissingExtension(filename) => AppError::UnsupportedMediaType(format!(
            "The file '{}' has no extension. Please upload a file in one of the following formats: jpeg, jpg, png, gif, or webp.",
            filename
        )),
    }
}

fn invalid_format_message(allowed: &[String]) -> String {
    let formats: Vec<String> = allowed
        .iter()
        .map(|f| f.trim_start_matches("image/").to_string())
        .collect();
    format!(
        "Invalid file type. Please upload a file in one of the following formats: {}.",
        formats.join(", ")
    )
}

/// Map processing failures: bad user parameters surface as 400, everything
/// else is a processing fault.
fn processing_to_app(err: ProcessingError) -> AppError {
    match err {
        ProcessingError::UnsupportedFormat(format) => AppError::UnsupportedMediaType(format!(
            "Invalid file type: {}. Please upload a file in one of the following formats: jpeg, jpg, png, gif, or webp.",
            format
        )),
        ProcessingError::InvalidSpec(msg) => AppError::InvalidInput(msg),
        other => AppError::Processing(other.to_string()),
    }
}
