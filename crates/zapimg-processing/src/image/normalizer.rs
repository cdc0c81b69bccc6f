//! Media normalizer
//!
//! Every accepted upload is re-encoded before storage, applying the
//! per-format compression policy and baking in EXIF orientation. Animated
//! inputs (GIF, animated WebP) keep their animation.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{AnimationDecoder, DynamicImage};
use zapimg_core::PngCompression;

use super::orientation::apply_exif_orientation;
use crate::error::ProcessingError;

/// Per-format encode parameters, sourced from configuration.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub jpeg_quality: u8,
    pub png_compression: PngCompression,
    pub webp_quality: f32,
    pub gif_encode_speed: i32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            jpeg_quality: 70,
            png_compression: PngCompression::Default,
            webp_quality: 80.0,
            gif_encode_speed: 10,
        }
    }
}

/// Output of a normalization pass: the re-encoded bytes plus the content
/// type under which they must be stored.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: Bytes,
    pub content_type: &'static str,
}

/// Re-encode uploaded bytes according to the declared MIME type.
///
/// The accepted set is `{jpeg, jpg, png, webp, gif}`; anything else is
/// `UnsupportedFormat`. The orchestrator rejects unknown types before
/// calling this, so the check here is defense in depth.
pub fn normalize(
    data: &[u8],
    declared_mime: &str,
    opts: &NormalizeOptions,
) -> Result<NormalizedImage, ProcessingError> {
    match declared_mime.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => {
            let img = decode(data)?;
            let img = apply_exif_orientation(img, data);
            Ok(NormalizedImage {
                data: encode_jpeg(&img, opts.jpeg_quality)?,
                content_type: "image/jpeg",
            })
        }
        "image/png" => {
            let img = decode(data)?;
            let img = apply_exif_orientation(img, data);
            Ok(NormalizedImage {
                data: encode_png(&img, opts.png_compression)?,
                content_type: "image/png",
            })
        }
        "image/webp" => {
            // Animated WebP passes through unchanged: the encoder only
            // handles still frames, and a re-encode that flattens animation
            // would lose content.
            if is_animated_webp(data) {
                return Ok(NormalizedImage {
                    data: Bytes::copy_from_slice(data),
                    content_type: "image/webp",
                });
            }
            let img = decode(data)?;
            let img = apply_exif_orientation(img, data);
            Ok(NormalizedImage {
                data: encode_webp(&img, opts.webp_quality)?,
                content_type: "image/webp",
            })
        }
        "image/gif" => Ok(NormalizedImage {
            data: reencode_gif(data, opts.gif_encode_speed)?,
            content_type: "image/gif",
        }),
        other => Err(ProcessingError::UnsupportedFormat(other.to_string())),
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
    image::load_from_memory(data).map_err(|e| ProcessingError::Decode(e.to_string()))
}

/// Encode to JPEG via mozjpeg (progressive, optimized coding).
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, ProcessingError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp
        .start_compress(Vec::new())
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    comp.write_scanlines(&rgb_img)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    let jpeg_data = comp
        .finish()
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;

    Ok(Bytes::from(jpeg_data))
}

fn encode_png(img: &DynamicImage, compression: PngCompression) -> Result<Bytes, ProcessingError> {
    let compression_type = match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression_type, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;

    Ok(Bytes::from(buffer))
}

fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Bytes, ProcessingError> {
    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();

    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode(quality);

    Ok(Bytes::copy_from_slice(&webp_data))
}

/// Full GIF transcode: decode every frame, re-encode preserving frame
/// delays and infinite looping.
fn reencode_gif(data: &[u8], speed: i32) -> Result<Bytes, ProcessingError> {
    let decoder =
        GifDecoder::new(Cursor::new(data)).map_err(|e| ProcessingError::Decode(e.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, speed);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;
        encoder
            .encode_frames(frames)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    }

    Ok(Bytes::from(buffer))
}

/// Animated WebP carries a VP8X chunk with the animation flag set.
fn is_animated_webp(data: &[u8]) -> bool {
    data.len() > 20
        && &data[0..4] == b"RIFF"
        && &data[8..12] == b"WEBP"
        && &data[12..16] == b"VP8X"
        && (data[20] & 0x02) != 0
}
