//! Payment verification state machine
//!
//! Drives session authentication off invoice state:
//!
//! - no invoice stored, or stored invoice expired -> `init` creates a new
//!   payment request and replaces the session's invoice
//! - invoice stored and unexpired -> `init` re-fetches its payment methods
//!   (idempotent re-display)
//! - `verify` short-circuits once authenticated; otherwise it polls the
//!   processor and sets the sticky flag when the invoice settled
//!
//! Processor failures propagate to the caller without touching session
//! state; the client is expected to re-invoke.

use std::sync::Arc;

use zapimg_core::models::Session;

use crate::error::PaymentError;
use crate::processor::PaymentProcessor;

/// What the client needs to pay: destination, wallet link, invoice id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub destination: String,
    pub payment_link: String,
    pub invoice_id: String,
}

pub struct PaymentVerifier {
    processor: Arc<dyn PaymentProcessor>,
    amount_sats: u64,
}

impl PaymentVerifier {
    pub fn new(processor: Arc<dyn PaymentProcessor>, amount_sats: u64) -> Self {
        Self {
            processor,
            amount_sats,
        }
    }

    /// Create or re-present the session's payment request. `now` is the
    /// current unix time in seconds.
    pub async fn init(
        &self,
        session: &mut Session,
        now: i64,
    ) -> Result<AuthChallenge, PaymentError> {
        let invoice_id = match session.auth_invoice_id.clone() {
            Some(id) if !session.invoice_expired(now) => id,
            _ => {
                let created = self.processor.create_invoice(self.amount_sats).await?;
                session.set_invoice(created.id.clone(), created.expires_at);
                created.id
            }
        };

        let methods = self.processor.payment_methods(&invoice_id).await?;

        Ok(AuthChallenge {
            destination: methods.destination,
            payment_link: methods.payment_link,
            invoice_id,
        })
    }

    /// Check whether the session's invoice has settled, updating
    /// `is_authenticated` as a side effect. Already-authenticated sessions
    /// short-circuit without a processor round trip.
    pub async fn verify(&self, session: &mut Session) -> Result<bool, PaymentError> {
        if session.is_authenticated {
            return Ok(true);
        }

        let Some(invoice_id) = session.auth_invoice_id.clone() else {
            return Ok(false);
        };

        let status = self.processor.invoice_status(&invoice_id).await?;

        if status.is_settled() {
            tracing::info!(invoice_id = %invoice_id, "Invoice settled, session authenticated");
            session.is_authenticated = true;
        }

        Ok(session.is_authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{CreatedInvoice, InvoiceStatus, PaymentMethods};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Scripted processor: counts calls and serves configurable responses.
    struct MockProcessor {
        create_count: Mutex<u32>,
        status: Mutex<Result<InvoiceStatus, ()>>,
        expires_at: i64,
    }

    impl MockProcessor {
        fn new(status: InvoiceStatus, expires_at: i64) -> Self {
            Self {
                create_count: Mutex::new(0),
                status: Mutex::new(Ok(status)),
                expires_at,
            }
        }

        fn failing_status(expires_at: i64) -> Self {
            Self {
                create_count: Mutex::new(0),
                status: Mutex::new(Err(())),
                expires_at,
            }
        }

        fn creates(&self) -> u32 {
            *self.create_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl PaymentProcessor for MockProcessor {
        async fn create_invoice(&self, _amount_sats: u64) -> Result<CreatedInvoice, PaymentError> {
            let mut count = self.create_count.lock().unwrap();
            *count += 1;
            Ok(CreatedInvoice {
                id: format!("inv-{}", count),
                expires_at: self.expires_at,
            })
        }

        async fn payment_methods(
            &self,
            invoice_id: &str,
        ) -> Result<PaymentMethods, PaymentError> {
            Ok(PaymentMethods {
                destination: format!("lnbc-{}", invoice_id),
                payment_link: format!("lightning:lnbc-{}", invoice_id),
            })
        }

        async fn invoice_status(&self, _invoice_id: &str) -> Result<InvoiceStatus, PaymentError> {
            self.status
                .lock()
                .unwrap()
                .clone()
                .map_err(|_| PaymentError::Transport("connection refused".to_string()))
        }
    }

    fn verifier(processor: Arc<MockProcessor>) -> PaymentVerifier {
        PaymentVerifier::new(processor, 615)
    }

    #[tokio::test]
    async fn test_init_creates_invoice_when_none_stored() {
        let processor = Arc::new(MockProcessor::new(InvoiceStatus::New, 10_000));
        let v = verifier(processor.clone());
        let mut session = Session::new(Utc::now());

        let challenge = v.init(&mut session, 1_000).await.unwrap();

        assert_eq!(challenge.invoice_id, "inv-1");
        assert_eq!(challenge.destination, "lnbc-inv-1");
        assert_eq!(challenge.payment_link, "lightning:lnbc-inv-1");
        assert_eq!(session.auth_invoice_id.as_deref(), Some("inv-1"));
        assert_eq!(session.auth_invoice_expires_at, Some(10_000));
        assert_eq!(processor.creates(), 1);
    }

    #[tokio::test]
    async fn test_init_is_idempotent_while_unexpired() {
        let processor = Arc::new(MockProcessor::new(InvoiceStatus::New, 10_000));
        let v = verifier(processor.clone());
        let mut session = Session::new(Utc::now());

        let first = v.init(&mut session, 1_000).await.unwrap();
        let second = v.init(&mut session, 2_000).await.unwrap();

        assert_eq!(first.invoice_id, second.invoice_id);
        assert_eq!(processor.creates(), 1);
    }

    #[tokio::test]
    async fn test_init_replaces_expired_invoice() {
        let processor = Arc::new(MockProcessor::new(InvoiceStatus::New, 10_000));
        let v = verifier(processor.clone());
        let mut session = Session::new(Utc::now());

        let first = v.init(&mut session, 1_000).await.unwrap();
        // Advance past expiration
        let second = v.init(&mut session, 10_000).await.unwrap();

        assert_ne!(first.invoice_id, second.invoice_id);
        assert_eq!(processor.creates(), 2);
        assert_eq!(session.auth_invoice_id, Some(second.invoice_id));
    }

    #[tokio::test]
    async fn test_verify_sets_sticky_flag_on_settled() {
        let processor = Arc::new(MockProcessor::new(InvoiceStatus::Settled, 10_000));
        let v = verifier(processor.clone());
        let mut session = Session::new(Utc::now());
        session.set_invoice("inv-x".to_string(), 10_000);

        assert!(v.verify(&mut session).await.unwrap());
        assert!(session.is_authenticated);

        // Once set, verification never resets it - even if the processor
        // would now fail.
        *processor.status.lock().unwrap() = Err(());
        assert!(v.verify(&mut session).await.unwrap());
        assert!(session.is_authenticated);
    }

    #[tokio::test]
    async fn test_verify_pending_invoice_stays_unauthenticated() {
        let processor = Arc::new(MockProcessor::new(InvoiceStatus::Processing, 10_000));
        let v = verifier(processor);
        let mut session = Session::new(Utc::now());
        session.set_invoice("inv-x".to_string(), 10_000);

        assert!(!v.verify(&mut session).await.unwrap());
        assert!(!session.is_authenticated);
    }

    #[tokio::test]
    async fn test_verify_without_invoice_is_false_without_processor_call() {
        // A failing processor proves verify never reaches it when the
        // session has no invoice.
        let processor = Arc::new(MockProcessor::failing_status(10_000));
        let v = verifier(processor);
        let mut session = Session::new(Utc::now());

        assert!(!v.verify(&mut session).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_transport_error_leaves_session_untouched() {
        let processor = Arc::new(MockProcessor::failing_status(10_000));
        let v = verifier(processor);
        let mut session = Session::new(Utc::now());
        session.set_invoice("inv-x".to_string(), 10_000);

        let result = v.verify(&mut session).await;
        assert!(result.is_err());
        assert!(!session.is_authenticated);
        assert_eq!(session.auth_invoice_id.as_deref(), Some("inv-x"));
    }
}
