//! zapimg processing library
//!
//! Media normalization for uploads: per-format image re-encoding with EXIF
//! orientation correction, upload validation, and the FFmpeg-backed
//! video-to-animated-GIF transcode pipeline.

pub mod error;
pub mod gif;
pub mod image;
pub mod validator;

pub use crate::error::ProcessingError;
pub use crate::gif::{
    scale_to_short_edge, CropRect, GifRenderSpec, GifTranscoder, ScaleMode, VideoProbe,
};
pub use crate::image::{normalize, NormalizeOptions, NormalizedImage};
pub use crate::validator::{MediaValidator, ValidationError};
