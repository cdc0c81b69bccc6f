//! zapimg payments library
//!
//! Lightning payment integration: the `PaymentProcessor` trait abstracts
//! invoice creation and status lookup, `BtcPayClient` implements it against
//! a BTCPay Server Greenfield API, and `PaymentVerifier` drives the
//! session-authentication state machine on top.

pub mod btcpay;
pub mod error;
pub mod processor;
pub mod verifier;

pub use btcpay::{BtcPayClient, BtcPayConfig};
pub use error::PaymentError;
pub use processor::{CreatedInvoice, InvoiceStatus, PaymentMethods, PaymentProcessor};
pub use verifier::{AuthChallenge, PaymentVerifier};
