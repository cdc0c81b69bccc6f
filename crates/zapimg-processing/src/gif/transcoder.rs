//! FFmpeg-backed animated-GIF rendering
//!
//! The transcode is CPU-heavy and runs out of process: one FFmpeg
//! invocation covers trim, crop, high-quality scaling, shared palette
//! generation (capped color count) and dithered palette application.
//! Callers own the input/output paths; request-scoped temp directories
//! keep concurrent transcodes from colliding.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProcessingError;

/// Crop rectangle as fractions of the source dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// The full frame (no-op crop).
    pub fn full() -> Self {
        CropRect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), ProcessingError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.x) || !in_unit(self.y) || !in_unit(self.width) || !in_unit(self.height) {
            return Err(ProcessingError::InvalidSpec(
                "crop values must be fractions in [0, 1]".to_string(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ProcessingError::InvalidSpec(
                "crop region must have a positive width and height".to_string(),
            ));
        }
        if self.x + self.width > 1.0 + f64::EPSILON || self.y + self.height > 1.0 + f64::EPSILON {
            return Err(ProcessingError::InvalidSpec(
                "crop region extends outside the frame".to_string(),
            ));
        }
        Ok(())
    }

    fn is_full_frame(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 1.0 && self.height == 1.0
    }
}

/// Scaling policy for the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Scale so the shorter edge lands on the target, preserving aspect.
    ShortEdge(u32),
    /// Explicit output dimensions (pre-computed from a probe).
    Exact { width: u32, height: u32 },
}

/// Parameters for a single render.
#[derive(Debug, Clone)]
pub struct GifRenderSpec {
    /// Trim the source to this many seconds from the start; `None` keeps
    /// the full source (the URL-fetch variant).
    pub duration_secs: Option<f64>,
    pub crop: CropRect,
    pub scale: ScaleMode,
    /// Shared palette size cap (64 in production).
    pub max_colors: u32,
}

impl GifRenderSpec {
    pub fn validate(&self) -> Result<(), ProcessingError> {
        if let Some(duration) = self.duration_secs {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(ProcessingError::InvalidSpec(
                    "duration must be a positive number of seconds".to_string(),
                ));
            }
        }
        self.crop.validate()
    }
}

pub struct GifTranscoder {
    ffmpeg_path: String,
    timeout: Duration,
}

impl GifTranscoder {
    pub fn new(ffmpeg_path: String, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
        }
    }

    /// Render `input` to an animated GIF at `output`.
    pub async fn render(
        &self,
        input: &Path,
        output: &Path,
        spec: &GifRenderSpec,
    ) -> Result<(), ProcessingError> {
        spec.validate()?;

        let filtergraph = build_filtergraph(spec);

        let start = std::time::Instant::now();

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y").arg("-i").arg(input);
        if let Some(duration) = spec.duration_secs {
            cmd.arg("-t").arg(format!("{}", duration));
        }
        let child = cmd
            .arg("-filter_complex")
            .arg(&filtergraph)
            .arg("-f")
            .arg("gif")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let result = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| ProcessingError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                ProcessingError::TranscodeFailed(format!("Failed to execute ffmpeg: {}", e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ProcessingError::TranscodeFailed(format!(
                "FFmpeg exited with {}: {}",
                result.status, stderr
            )));
        }

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            duration_secs = spec.duration_secs,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GIF transcode complete"
        );

        Ok(())
    }
}

/// Build the FFmpeg filtergraph: crop -> scale -> split -> palettegen ->
/// paletteuse. Pure so the graph construction is testable without FFmpeg.
fn build_filtergraph(spec: &GifRenderSpec) -> String {
    let mut chain: Vec<String> = Vec::new();

    if !spec.crop.is_full_frame() {
        chain.push(format!(
            "crop=iw*{w}:ih*{h}:iw*{x}:ih*{y}",
            w = spec.crop.width,
            h = spec.crop.height,
            x = spec.crop.x,
            y = spec.crop.y,
        ));
    }

    chain.push(match spec.scale {
        ScaleMode::ShortEdge(target) => format!(
            "scale='if(lt(iw,ih),{t},-2)':'if(lt(iw,ih),-2,{t})':flags=lanczos",
            t = target
        ),
        ScaleMode::Exact { width, height } => {
            format!("scale={}:{}:flags=lanczos", width, height)
        }
    });

    format!(
        "[0:v]{chain},split[a][b];[a]palettegen=max_colors={colors}:stats_mode=diff[p];[b][p]paletteuse=dither=bayer:bayer_scale=5:diff_mode=rectangle",
        chain = chain.join(","),
        colors = spec.max_colors,
    )
}
