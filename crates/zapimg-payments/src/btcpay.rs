//! BTCPay Server Greenfield API client
//!
//! Implements [`PaymentProcessor`] against a BTCPay Server store. Invoices
//! are created Lightning-only with the store's checkout policy; status
//! lookups go through the invoice text search, which is the endpoint the
//! access token is scoped to.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::PaymentError;
use crate::processor::{CreatedInvoice, InvoiceStatus, PaymentMethods, PaymentProcessor};

#[derive(Debug, Clone)]
pub struct BtcPayConfig {
    /// Base URL of the BTCPay Server instance, without trailing slash.
    pub base_url: String,
    pub store_id: String,
    /// Greenfield API access token.
    pub token: String,
    pub currency: String,
    pub invoice_expiration_minutes: u32,
    pub timeout: Duration,
}

pub struct BtcPayClient {
    http: reqwest::Client,
    config: BtcPayConfig,
}

#[derive(Debug, Deserialize)]
struct InvoiceData {
    id: String,
    #[serde(rename = "expirationTime")]
    expiration_time: i64,
}

#[derive(Debug, Deserialize)]
struct InvoiceSearchEntry {
    status: String,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodData {
    destination: String,
    #[serde(rename = "paymentLink")]
    payment_link: String,
}

impl BtcPayClient {
    pub fn new(config: BtcPayConfig) -> Result<Self, PaymentError> {
        if config.token.is_empty() {
            return Err(PaymentError::Config(
                "BTCPay access token is empty".to_string(),
            ));
        }
        if config.store_id.is_empty() {
            return Err(PaymentError::Config("BTCPay store id is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn invoices_url(&self) -> String {
        format!(
            "{}/api/v1/stores/{}/invoices",
            self.config.base_url.trim_end_matches('/'),
            self.config.store_id
        )
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.config.token)
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

/// Invoice creation body: Lightning-only checkout with the store policy the
/// service has always used.
fn invoice_request_body(amount_sats: u64, currency: &str, expiration_minutes: u32) -> Value {
    json!({
        "checkout": {
            "speedPolicy": "HighSpeed",
            "paymentMethods": ["BTC-LightningNetwork"],
            "defaultPaymentMethod": "BTC-LightningNetwork",
            "expirationMinutes": expiration_minutes,
            "monitoringMinutes": expiration_minutes,
            "paymentTolerance": 0,
            "redirectAutomatically": true,
            "requiresRefundEmail": false,
        },
        "receipt": {
            "enabled": true,
        },
        "amount": amount_sats.to_string(),
        "currency": currency,
    })
}

#[async_trait]
impl PaymentProcessor for BtcPayClient {
    async fn create_invoice(&self, amount_sats: u64) -> Result<CreatedInvoice, PaymentError> {
        let body = invoice_request_body(
            amount_sats,
            &self.config.currency,
            self.config.invoice_expiration_minutes,
        );

        let response = self
            .http
            .post(self.invoices_url())
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        let response = self.check_status(response).await?;

        let invoice: InvoiceData = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            invoice_id = %invoice.id,
            amount_sats = amount_sats,
            expires_at = invoice.expiration_time,
            "Created payment invoice"
        );

        Ok(CreatedInvoice {
            id: invoice.id,
            expires_at: invoice.expiration_time,
        })
    }

    async fn payment_methods(&self, invoice_id: &str) -> Result<PaymentMethods, PaymentError> {
        let url = format!("{}/{}/payment-methods", self.invoices_url(), invoice_id);

        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let response = self.check_status(response).await?;

        let methods: Vec<PaymentMethodData> = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        let method = methods.into_iter().next().ok_or_else(|| {
            PaymentError::InvalidResponse("invoice has no payment methods".to_string())
        })?;

        Ok(PaymentMethods {
            destination: method.destination,
            payment_link: method.payment_link,
        })
    }

    async fn invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus, PaymentError> {
        let response = self
            .http
            .get(self.invoices_url())
            .header("Authorization", self.auth_header())
            .query(&[("textSearch", invoice_id)])
            .send()
            .await?;
        let response = self.check_status(response).await?;

        let invoices: Vec<InvoiceSearchEntry> = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        let entry = invoices.into_iter().next().ok_or_else(|| {
            PaymentError::InvalidResponse(format!("invoice {} not found", invoice_id))
        })?;

        Ok(InvoiceStatus::parse(&entry.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_request_body_shape() {
        let body = invoice_request_body(615, "SATS", 90);

        assert_eq!(body["amount"], "615");
        assert_eq!(body["currency"], "SATS");
        assert_eq!(body["checkout"]["speedPolicy"], "HighSpeed");
        assert_eq!(body["checkout"]["expirationMinutes"], 90);
        assert_eq!(
            body["checkout"]["paymentMethods"],
            json!(["BTC-LightningNetwork"])
        );
        assert_eq!(body["checkout"]["paymentTolerance"], 0);
    }

    #[test]
    fn test_client_rejects_missing_credentials() {
        let config = BtcPayConfig {
            base_url: "https://btcpay.example.com".to_string(),
            store_id: String::new(),
            token: "tok".to_string(),
            currency: "SATS".to_string(),
            invoice_expiration_minutes: 90,
            timeout: Duration::from_secs(10),
        };
        assert!(matches!(
            BtcPayClient::new(config),
            Err(PaymentError::Config(_))
        ));
    }

    #[test]
    fn test_invoice_data_deserialization() {
        let json = r#"{"id": "inv-123", "expirationTime": 1700000000, "status": "New"}"#;
        let invoice: InvoiceData = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.id, "inv-123");
        assert_eq!(invoice.expiration_time, 1_700_000_000);
    }

    #[test]
    fn test_payment_method_deserialization() {
        let json = r#"[{"destination": "lnbc1...", "paymentLink": "lightning:lnbc1...", "rate": "1"}]"#;
        let methods: Vec<PaymentMethodData> = serde_json::from_str(json).unwrap();
        assert_eq!(methods[0].destination, "lnbc1...");
        assert_eq!(methods[0].payment_link, "lightning:lnbc1...");
    }
}
