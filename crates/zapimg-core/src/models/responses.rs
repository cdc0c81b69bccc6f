//! API response bodies
//!
//! Field names are part of the public wire contract (camelCase, with the
//! historical `fileID` spelling) and must not change.

use serde::Serialize;
use utoipa::ToSchema;

/// Successful upload response, shared by the image, tinify and gifify routes.
///
/// The lightning fields are informational tip/support pointers, not a payment
/// requirement for the upload that just completed.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Site-relative route to the stored object, e.g. `/i/a1b2c3d4.jpg`
    pub route: String,
    /// Absolute URL on the main site
    pub url: String,
    /// Absolute URL on the direct image host
    pub image_url: String,
    pub file_name: String,
    #[serde(rename = "fileID")]
    pub file_id: String,
    pub message: String,
    pub lightning_destination: String,
    pub lightning_payment_link: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthInitResponse {
    pub lightning_destination: String,
    pub lightning_payment_link: String,
    pub auth_invoice_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthVerifyResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_invoice_id: Option<String>,
}
