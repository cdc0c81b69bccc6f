//! Video-to-animated-GIF transcoding module

pub mod probe;
pub mod transcoder;

pub use probe::{scale_to_short_edge, VideoProbe};
pub use transcoder::{CropRect, GifRenderSpec, GifTranscoder, ScaleMode};
