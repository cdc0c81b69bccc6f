//! ffprobe-based source inspection
//!
//! The URL-fetch route needs the source dimensions before the transcode so
//! it can compute an exact aspect-preserving scale to the short-edge
//! target.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProcessingError;

pub struct VideoProbe {
    ffprobe_path: String,
    timeout: Duration,
}

impl VideoProbe {
    pub fn new(ffprobe_path: String, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Read the dimensions of the first video stream.
    pub async fn dimensions(&self, input: &Path) -> Result<(u32, u32), ProcessingError> {
        let child = Command::new(&self.ffprobe_path)
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg("stream=width,height")
            .arg("-of")
            .arg("csv=s=x:p=0")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| ProcessingError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                ProcessingError::TranscodeFailed(format!("Failed to execute ffprobe: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProcessingError::TranscodeFailed(format!(
                "ffprobe exited with {}: {}",
                output.status, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_dimensions(stdout.trim())
    }
}

fn parse_dimensions(line: &str) -> Result<(u32, u32), ProcessingError> {
    let mut parts = line.trim().trim_end_matches('x').split('x');
    let width = parts
        .next()
        .and_then(|w| w.trim().parse::<u32>().ok())
        .filter(|w| *w > 0);
    let height = parts
        .next()
        .and_then(|h| h.trim().parse::<u32>().ok())
        .filter(|h| *h > 0);

    match (width, height) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(ProcessingError::Decode(format!(
            "ffprobe returned unparseable dimensions: {:?}",
            line
        ))),
    }
}

/// Compute output dimensions scaled so the shorter edge lands on `target`,
/// preserving aspect ratio. Dimensions are rounded to even values (required
/// by most video filters); sources already smaller than the target are left
/// at their own size.
pub fn scale_to_short_edge(width: u32, height: u32, target: u32) -> (u32, u32) {
    let short = width.min(height);
    if short <= target {
        return (make_even(width), make_even(height));
    }

    let ratio = target as f64 / short as f64;
    let scaled_w = (width as f64 * ratio).round() as u32;
    let scaled_h = (height as f64 * ratio).round() as u32;
    (make_even(scaled_w.max(2)), make_even(scaled_h.max(2)))
}

fn make_even(v: u32) -> u32 {
    if v % 2 == 0 {
        v
    } else {
        v + 1
    }
}
