//! zapimg core library
//!
//! Shared foundation for the zapimg services: configuration, the unified
//! error taxonomy, domain models (sessions, upload responses), the file
//! identifier generator, and the upload access gate.

pub mod config;
pub mod error;
pub mod file_id;
pub mod gate;
pub mod models;

pub use config::{Config, PngCompression, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use file_id::FileId;
pub use gate::is_authorized;
