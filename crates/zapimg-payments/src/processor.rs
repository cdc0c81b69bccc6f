//! Payment processor abstraction
//!
//! The narrow contract the core needs from any Lightning payment backend:
//! create an invoice, fetch its payment methods, and look up settlement
//! status. Errors propagate; no retries happen at this layer.

use async_trait::async_trait;

use crate::error::PaymentError;

/// A freshly created payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedInvoice {
    pub id: String,
    /// Unix timestamp (seconds) at which the invoice expires.
    pub expires_at: i64,
}

/// How a pending invoice can be paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethods {
    /// Lightning destination (BOLT11 invoice / address)
    pub destination: String,
    /// `lightning:` payment link for wallets
    pub payment_link: String,
}

/// Settlement status of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceStatus {
    New,
    Processing,
    Settled,
    Expired,
    Invalid,
    Other(String),
}

impl InvoiceStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "New" => InvoiceStatus::New,
            "Processing" => InvoiceStatus::Processing,
            "Settled" => InvoiceStatus::Settled,
            "Expired" => InvoiceStatus::Expired,
            "Invalid" => InvoiceStatus::Invalid,
            other => InvoiceStatus::Other(other.to_string()),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, InvoiceStatus::Settled)
    }
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment request for the given amount.
    async fn create_invoice(&self, amount_sats: u64) -> Result<CreatedInvoice, PaymentError>;

    /// Fetch the payment methods of an existing invoice.
    async fn payment_methods(&self, invoice_id: &str) -> Result<PaymentMethods, PaymentError>;

    /// Look up the current status of an invoice.
    async fn invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_status_parse() {
        assert_eq!(InvoiceStatus::parse("Settled"), InvoiceStatus::Settled);
        assert_eq!(InvoiceStatus::parse("New"), InvoiceStatus::New);
        assert_eq!(InvoiceStatus::parse("Expired"), InvoiceStatus::Expired);
        assert_eq!(
            InvoiceStatus::parse("SomethingElse"),
            InvoiceStatus::Other("SomethingElse".to_string())
        );
        // Case sensitive by design: BTCPay statuses are PascalCase
        assert_eq!(
            InvoiceStatus::parse("settled"),
            InvoiceStatus::Other("settled".to_string())
        );
    }

    #[test]
    fn test_is_settled() {
        assert!(InvoiceStatus::Settled.is_settled());
        assert!(!InvoiceStatus::Processing.is_settled());
        assert!(!InvoiceStatus::Other("Settled-ish".to_string()).is_settled());
    }
}
