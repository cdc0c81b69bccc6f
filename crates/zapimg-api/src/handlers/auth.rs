//! Lightning authentication handlers
//!
//! `/auth/init` creates (or re-presents) the session's payment request;
//! `/auth/verify` polls settlement and flips the sticky session flag.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use zapimg_core::models::{AuthInitResponse, AuthVerifyResponse};

use crate::error::{ErrorResponse, HttpAppError};
use crate::session::SessionContext;
use crate::state::AppState;

/// Initiate (or refresh) the payment challenge for this session.
#[utoipa::path(
    get,
    path = "/auth/init",
    tag = "auth",
    responses(
        (status = 200, description = "Payment challenge for this session", body = AuthInitResponse),
        (status = 500, description = "Payment processor unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session), fields(operation = "auth_init"))]
pub async fn auth_init(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Json<AuthInitResponse>, HttpAppError> {
    let mut snapshot = session.snapshot();

    let challenge = state
        .payments
        .init(&mut snapshot, Utc::now().timestamp())
        .await?;

    // Persist the (possibly replaced) invoice back to the store.
    session.update(|s| {
        s.auth_invoice_id = snapshot.auth_invoice_id.clone();
        s.auth_invoice_expires_at = snapshot.auth_invoice_expires_at;
    });

    Ok(Json(AuthInitResponse {
        lightning_destination: challenge.destination,
        lightning_payment_link: challenge.payment_link,
        auth_invoice_id: challenge.invoice_id,
    }))
}

/// Report whether this session's payment has settled.
#[utoipa::path(
    get,
    path = "/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "Current authentication state", body = AuthVerifyResponse),
        (status = 500, description = "Payment processor unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session), fields(operation = "auth_verify"))]
pub async fn auth_verify(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Json<AuthVerifyResponse>, HttpAppError> {
    let mut snapshot = session.snapshot();

    let is_authenticated = state.payments.verify(&mut snapshot).await?;

    if is_authenticated {
        // Sticky: only ever set, never cleared.
        session.update(|s| s.is_authenticated = true);
    }

    Ok(Json(AuthVerifyResponse {
        is_authenticated,
        auth_invoice_id: snapshot.auth_invoice_id,
    }))
}
