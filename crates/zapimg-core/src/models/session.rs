//! Per-client session state
//!
//! A session tracks everything the access gate and payment verifier need:
//! whether a payment has ever settled, the most recently issued invoice,
//! and how many uploads have succeeded. Sessions are keyed by an opaque
//! client-presented token; how they are persisted is up to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// True once a payment has been confirmed settled. Sticky: no code path
    /// resets it for the life of the session.
    pub is_authenticated: bool,
    /// Identifier of the most recently created payment request, replaced
    /// (not appended) whenever a new one is generated.
    pub auth_invoice_id: Option<String>,
    /// Unix timestamp (seconds) at which that payment request expires.
    pub auth_invoice_expires_at: Option<i64>,
    /// Count of successful uploads. Only increases, and only after a
    /// successful storage write.
    pub total_uploads: u32,
    pub created_at: DateTime<Utc>,
    /// Updated on every access; drives retention-window expiry.
    pub last_seen_at: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Session {
            is_authenticated: false,
            auth_invoice_id: None,
            auth_invoice_expires_at: None,
            total_uploads: 0,
            created_at: now,
            last_seen_at: now,
        }
    }

    /// Whether the stored invoice (if any) has expired at `now` (unix seconds).
    pub fn invoice_expired(&self, now: i64) -> bool {
        match self.auth_invoice_expires_at {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    /// Record a newly created payment request, replacing any previous one.
    pub fn set_invoice(&mut self, invoice_id: String, expires_at: i64) {
        self.auth_invoice_id = Some(invoice_id);
        self.auth_invoice_expires_at = Some(expires_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let s = Session::new(Utc::now());
        assert!(!s.is_authenticated);
        assert!(s.auth_invoice_id.is_none());
        assert_eq!(s.total_uploads, 0);
    }

    #[test]
    fn test_invoice_expired() {
        let mut s = Session::new(Utc::now());
        // No invoice at all counts as expired (a new one must be created).
        assert!(s.invoice_expired(1_000));

        s.set_invoice("inv-1".to_string(), 2_000);
        assert!(!s.invoice_expired(1_999));
        assert!(s.invoice_expired(2_000));
        assert!(s.invoice_expired(2_001));
    }

    #[test]
    fn test_set_invoice_replaces() {
        let mut s = Session::new(Utc::now());
        s.set_invoice("inv-1".to_string(), 2_000);
        s.set_invoice("inv-2".to_string(), 3_000);
        assert_eq!(s.auth_invoice_id.as_deref(), Some("inv-2"));
        assert_eq!(s.auth_invoice_expires_at, Some(3_000));
    }
}
