//! zapimg API
//!
//! The HTTP application: session layer, upload orchestration, auth routes
//! against the payment verifier, and route/server setup. The binary in
//! `main.rs` wires configuration and real backends; integration tests build
//! the same router against a local storage directory and a mock payment
//! processor.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod services;
pub mod session;
pub mod setup;
pub mod state;
pub mod telemetry;
