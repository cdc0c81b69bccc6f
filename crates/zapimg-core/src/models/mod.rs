//! Domain models

pub mod responses;
pub mod session;

pub use responses::{AuthInitResponse, AuthVerifyResponse, UploadResponse};
pub use session::Session;
