//! Image normalization module

pub mod normalizer;
pub mod orientation;

pub use normalizer::{normalize, NormalizeOptions, NormalizedImage};
