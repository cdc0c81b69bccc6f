//! Payment error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment processor transport error: {0}")]
    Transport(String),

    #[error("Payment processor timed out")]
    Timeout,

    #[error("Payment processor returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected payment processor response: {0}")]
    InvalidResponse(String),

    #[error("Payment processor not configured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PaymentError::Timeout
        } else {
            PaymentError::Transport(err.to_string())
        }
    }
}
