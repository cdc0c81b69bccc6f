//! Scripted payment processor for integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use zapimg_payments::{
    CreatedInvoice, InvoiceStatus, PaymentError, PaymentMethods, PaymentProcessor,
};

pub struct MockProcessor {
    create_count: Mutex<u32>,
    status: Mutex<InvoiceStatus>,
    expires_at: Mutex<i64>,
    fail: Mutex<bool>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            create_count: Mutex::new(0),
            status: Mutex::new(InvoiceStatus::New),
            // Far enough in the future for any test run
            expires_at: Mutex::new(chrono::Utc::now().timestamp() + 3600),
            fail: Mutex::new(false),
        }
    }

    pub fn create_count(&self) -> u32 {
        *self.create_count.lock().unwrap()
    }

    /// Mark every invoice as settled from now on.
    pub fn settle(&self) {
        *self.status.lock().unwrap() = InvoiceStatus::Settled;
    }

    /// Make newly created invoices already expired.
    pub fn expire_new_invoices(&self) {
        *self.expires_at.lock().unwrap() = chrono::Utc::now().timestamp() - 60;
    }

    /// Fail every subsequent processor call.
    pub fn fail_requests(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Clear the failure flag.
    pub fn recover(&self) {
        *self.fail.lock().unwrap() = false;
    }

    fn check_fail(&self) -> Result<(), PaymentError> {
        if *self.fail.lock().unwrap() {
            Err(PaymentError::Transport("mock failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_invoice(&self, _amount_sats: u64) -> Result<CreatedInvoice, PaymentError> {
        self.check_fail()?;
        let mut count = self.create_count.lock().unwrap();
        *count += 1;
        Ok(CreatedInvoice {
            id: format!("inv-{}", count),
            expires_at: *self.expires_at.lock().unwrap(),
        })
    }

    async fn payment_methods(&self, invoice_id: &str) -> Result<PaymentMethods, PaymentError> {
        self.check_fail()?;
        Ok(PaymentMethods {
            destination: format!("lnbc-{}", invoice_id),
            payment_link: format!("lightning:lnbc-{}", invoice_id),
        })
    }

    async fn invoice_status(&self, _invoice_id: &str) -> Result<InvoiceStatus, PaymentError> {
        self.check_fail()?;
        Ok(self.status.lock().unwrap().clone())
    }
}
