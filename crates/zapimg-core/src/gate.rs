//! Upload access gate
//!
//! Authorization is a pure function of session state: a session may upload
//! while it still has free-tier quota, or once a payment has settled. It is
//! re-evaluated on every upload attempt because `total_uploads` changes
//! between requests.

use crate::models::Session;

/// Decide whether a session may invoke an upload route.
pub fn is_authorized(session: &Session, free_upload_quota: u32) -> bool {
    session.is_authenticated || session.total_uploads < free_upload_quota
}
